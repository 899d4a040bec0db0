//! End-to-end scenarios over the bundled sample designs.

mod common;

use tempus_timing::{PathKind, Split, TimingError, Trans};

const PIS: [&str; 5] = ["nx1", "nx2", "nx3", "nx6", "nx7"];

#[test]
fn c17_baseline_report() {
    let mut t = common::c17();
    t.update_timing(false);

    let tns = t.tns();
    let wns = t.wns();
    assert!(tns.is_finite());
    assert!(wns.is_finite());
    assert!(wns < 0.0, "the asserted required times are tight");
    assert!(tns <= wns);

    let paths = t.worst_paths(None, 2);
    assert_eq!(paths.len(), 2);
    for path in &paths {
        assert_eq!(path.kind, PathKind::Rat);
        assert!(path.steps.len() >= 2);
        let first = &path.steps.first().unwrap().pin;
        let last = &path.steps.last().unwrap().pin;
        assert!(PIS.contains(&first.as_str()), "path starts at an input");
        assert!(last == "nx22" || last == "nx23", "path ends at an output");
        assert!(path.slack.is_finite());
    }
    // Worst first.
    assert!(paths[0].slack <= paths[1].slack);

    t.check_graph().unwrap();
}

#[test]
fn c17_incremental_rewiring() {
    let mut t = common::c17();
    t.update_timing(false);

    // Splice a buffer into the nx6 input net.
    t.repower_gate("inst_0", "NAND2_X2").unwrap();
    t.insert_gate("TAUGATE_1", "BUF_X2").unwrap();
    t.insert_net("TAUNET_1").unwrap();
    t.disconnect_pin("nx6").unwrap();
    t.connect_pin("nx6", "TAUNET_1").unwrap();
    t.connect_pin("TAUGATE_1:a", "TAUNET_1").unwrap();
    t.connect_pin("TAUGATE_1:o", "nx6").unwrap();
    t.load_parasitics("TAUNET_1", &common::taunet_parasitics())
        .unwrap();
    t.load_parasitics("nx6", &common::nx6_parasitics()).unwrap();

    let slack = t.slack("nx22", Split::Late, Trans::Fall).unwrap();
    let at = t.at("nx22", Split::Late, Trans::Rise).unwrap();
    let rat = t.rat("nx22", Split::Early, Trans::Fall).unwrap();
    assert!(slack.is_finite());
    assert!(at.is_finite());
    assert!(rat.is_finite());

    // The slack invariant holds at the queried pin.
    let at_lf = t.at("nx22", Split::Late, Trans::Fall).unwrap();
    let rat_lf = t.rat("nx22", Split::Late, Trans::Fall).unwrap();
    assert!((slack - (rat_lf - at_lf)).abs() < 1e-9);

    t.check_graph().unwrap();
}

#[test]
fn c17_incremental_matches_full() {
    let mut t = common::c17();
    t.update_timing(false);
    t.repower_gate("inst_2", "NAND2_X2").unwrap();
    t.load_parasitics("n11", &{
        let mut desc = tempus_timing::ParasiticsDesc::default();
        desc.caps = vec![
            ("inst_1:o".to_string(), 0.05),
            ("inst_2:b".to_string(), 0.2),
            ("inst_3:a".to_string(), 0.2),
        ];
        desc.segments = vec![
            ("inst_1:o".to_string(), "inst_2:b".to_string(), 1.0),
            ("inst_1:o".to_string(), "inst_3:a".to_string(), 1.2),
        ];
        desc
    })
    .unwrap();

    let incr: Vec<f64> = ["nx22", "nx23"]
        .iter()
        .map(|po| t.slack(po, Split::Late, Trans::Fall).unwrap())
        .collect();
    t.update_timing(false);
    let full: Vec<f64> = ["nx22", "nx23"]
        .iter()
        .map(|po| t.slack(po, Split::Late, Trans::Fall).unwrap())
        .collect();
    for (a, b) in incr.iter().zip(&full) {
        assert!((a - b).abs() < 1e-4);
    }
}

#[test]
fn simple_mutation_storm_matches_full_update() {
    let mut t = common::simple(50.0);
    t.update_timing(false);

    t.repower_gate("u3", "INV_X1").unwrap();
    t.insert_gate("newbox", "INV_X3").unwrap();
    t.insert_net("newnet").unwrap();
    t.disconnect_pin("u3:o").unwrap();
    t.connect_pin("newbox:o", "out").unwrap();
    t.connect_pin("u3:o", "newnet").unwrap();
    t.connect_pin("newbox:a", "newnet").unwrap();
    t.load_parasitics("newnet", &{
        let mut desc = tempus_timing::ParasiticsDesc::default();
        desc.caps = vec![
            ("u3:o".to_string(), 0.1),
            ("newbox:a".to_string(), 0.15),
        ];
        desc.segments = vec![("u3:o".to_string(), "newbox:a".to_string(), 0.8)];
        desc
    })
    .unwrap();
    t.repower_gate("u3", "INV_X2").unwrap();
    t.disconnect_pin("newbox:a").unwrap();
    t.disconnect_pin("newbox:o").unwrap();
    t.disconnect_pin("u3:o").unwrap();
    t.remove_net("newnet").unwrap();
    t.remove_gate("newbox").unwrap();
    t.connect_pin("u3:o", "out").unwrap();
    t.load_parasitics("out", &{
        let mut desc = tempus_timing::ParasiticsDesc::default();
        desc.caps = vec![("u3:o".to_string(), 0.1), ("out".to_string(), 0.2)];
        desc.segments = vec![("u3:o".to_string(), "out".to_string(), 1.0)];
        desc
    })
    .unwrap();

    let incr = t.slack("out", Split::Late, Trans::Fall).unwrap();
    t.update_timing(false);
    let full = t.slack("out", Split::Late, Trans::Fall).unwrap();
    assert!((incr - full).abs() < 1e-4);
    t.check_graph().unwrap();
}

#[test]
fn empty_path_query_on_unknown_pin() {
    let mut t = common::simple(50.0);
    t.update_timing(false);
    assert!(t.worst_paths(Some("nonexistent_pin"), 5).is_empty());
    assert!(t.worst_paths(None, 0).is_empty());
}

#[test]
fn setup_paths_appear_under_a_tight_clock() {
    let mut t = common::simple(2.0);
    t.update_timing(false);
    let paths = t.worst_paths(None, 6);
    assert!(!paths.is_empty());
    assert!(
        paths.iter().any(|p| p.kind == PathKind::Setup),
        "a 2-unit period cannot absorb the data path delay"
    );
    for p in &paths {
        if p.kind == PathKind::Setup {
            assert_eq!(p.split, Split::Late);
            assert_eq!(p.steps.last().unwrap().pin, "f1:d");
        }
    }
    // Cache slacks are monotone non-decreasing.
    for pair in paths.windows(2) {
        assert!(pair[0].slack <= pair[1].slack);
    }
}

#[test]
fn worst_endpoints_are_ordered() {
    let mut t = common::c17();
    t.update_timing(false);
    let endpoints = t.worst_endpoints(None, 4);
    assert!(!endpoints.is_empty());
    for pair in endpoints.windows(2) {
        assert!(pair[0].slack <= pair[1].slack);
    }
    for ep in &endpoints {
        assert!(ep.pin == "nx22" || ep.pin == "nx23");
    }
}

#[test]
fn worst_paths_through_pin_filter() {
    let mut t = common::c17();
    t.update_timing(false);
    let paths = t.worst_paths(Some("inst_4:o"), 4);
    assert!(!paths.is_empty());
    for path in &paths {
        assert!(path.steps.iter().any(|s| s.pin == "inst_4:o"));
    }
}

#[test]
fn full_then_incremental_is_identical() {
    let mut t = common::simple(50.0);
    t.update_timing(false);
    let first = t.slack("out", Split::Late, Trans::Rise).unwrap();
    t.update_timing(true);
    let second = t.slack("out", Split::Late, Trans::Rise).unwrap();
    assert_eq!(first, second);
}

#[test]
fn connect_disconnect_roundtrip_restores_timing() {
    let mut t = common::c17();
    t.update_timing(false);
    let before = t.slack("nx22", Split::Late, Trans::Rise).unwrap();

    t.insert_gate("observer", "INV_X1").unwrap();
    t.connect_pin("observer:a", "n10").unwrap();
    t.disconnect_pin("observer:a").unwrap();
    t.remove_gate("observer").unwrap();

    let after = t.slack("nx22", Split::Late, Trans::Rise).unwrap();
    assert!((before - after).abs() < 1e-9);
}

#[test]
fn splice_driver_isolates_the_port() {
    let mut t = common::c17();
    t.update_timing(false);
    t.splice_driver("nx1", "drv_0", "BUF_X2").unwrap();
    // The driver's output now feeds the old net; the port is isolated.
    let at = t.at("drv_0:o", Split::Late, Trans::Rise).unwrap();
    assert!(at.is_finite() || at == Split::Late.undefined_at());
    let slack = t.slack("nx22", Split::Late, Trans::Fall).unwrap();
    assert!(slack.is_finite());
    t.check_graph().unwrap();
}

#[test]
fn mutators_reject_bad_requests() {
    let mut t = common::c17();
    assert!(matches!(
        t.connect_pin("inst_0:a", "n16"),
        Err(TimingError::InvalidMutation(_))
    ));
    assert!(matches!(
        t.remove_net("n10"),
        Err(TimingError::InvalidMutation(_))
    ));
    assert!(matches!(
        t.repower_gate("inst_0", "NO_SUCH_CELL"),
        Err(TimingError::MissingCell(_))
    ));
    assert!(matches!(
        t.at("ghost:pin", Split::Early, Trans::Rise),
        Err(TimingError::MissingPin(_))
    ));
}
