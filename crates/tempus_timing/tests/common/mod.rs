//! Shared fixtures: a small characterization library pair and the two
//! bundled sample designs.

use tempus_celllib::{
    Cell, CellLib, Cellpin, LutVariable, PinDirection, TimingArc, TimingLut, TimingSense,
    TimingType,
};
use tempus_timing::{ParasiticsDesc, Split, TimingAssertions, Timer};
use tempus_common::SplitTrans;

/// An affine table: `base + kslew·slew + kcap·load`. Bilinear
/// interpolation reproduces affine surfaces exactly, so expectations can
/// be computed by hand.
pub fn table(base: f64, kslew: f64, kcap: f64) -> TimingLut {
    let slews = [1.0, 10.0];
    let caps = [1.0, 10.0];
    TimingLut::grid(
        LutVariable::InputNetTransition,
        LutVariable::TotalOutputNetCapacitance,
        slews.to_vec(),
        caps.to_vec(),
        slews
            .iter()
            .map(|&s| caps.iter().map(|&c| base + kslew * s + kcap * c).collect())
            .collect(),
    )
}

fn delay_arc(related: &str, sense: TimingSense, kind: TimingType, base: f64) -> TimingArc {
    TimingArc {
        related_pin: related.to_string(),
        sense,
        kind,
        cell_rise: Some(table(base, 0.05, 0.2)),
        cell_fall: Some(table(base * 1.05, 0.05, 0.2)),
        rise_transition: Some(table(base * 0.5, 0.1, 0.1)),
        fall_transition: Some(table(base * 0.5, 0.1, 0.1)),
        rise_constraint: None,
        fall_constraint: None,
    }
}

fn one_input_cell(name: &str, sense: TimingSense, base: f64, cap: f64) -> Cell {
    let mut cell = Cell::new(name);
    cell.cellpins.push(Cellpin::new("a", PinDirection::Input, cap));
    let mut o = Cellpin::new("o", PinDirection::Output, 0.0);
    o.arcs
        .push(delay_arc("a", sense, TimingType::Combinational, base));
    cell.cellpins.push(o);
    cell
}

fn nand2(name: &str, base: f64, cap: f64) -> Cell {
    let mut cell = Cell::new(name);
    cell.cellpins.push(Cellpin::new("a", PinDirection::Input, cap));
    cell.cellpins.push(Cellpin::new("b", PinDirection::Input, cap));
    let mut o = Cellpin::new("o", PinDirection::Output, 0.0);
    for related in ["a", "b"] {
        o.arcs.push(delay_arc(
            related,
            TimingSense::NegativeUnate,
            TimingType::Combinational,
            base,
        ));
    }
    cell.cellpins.push(o);
    cell
}

fn dff(name: &str, base: f64, constraint_kind: TimingType, guard: f64) -> Cell {
    let mut cell = Cell::new(name);
    let mut ck = Cellpin::new("ck", PinDirection::Input, 1.0);
    ck.is_clock = true;
    cell.cellpins.push(ck);
    let mut d = Cellpin::new("d", PinDirection::Input, 1.0);
    d.nextstate_type = Some("d".to_string());
    d.arcs.push(TimingArc {
        related_pin: "ck".to_string(),
        sense: TimingSense::NonUnate,
        kind: constraint_kind,
        cell_rise: None,
        cell_fall: None,
        rise_transition: None,
        fall_transition: None,
        rise_constraint: Some(TimingLut::scalar(guard)),
        fall_constraint: Some(TimingLut::scalar(guard * 1.1)),
    });
    cell.cellpins.push(d);
    let mut q = Cellpin::new("q", PinDirection::Output, 0.0);
    q.arcs.push(delay_arc(
        "ck",
        TimingSense::NonUnate,
        TimingType::RisingEdge,
        base,
    ));
    cell.cellpins.push(q);
    cell
}

fn build_lib(scale: f64, constraint_kind: TimingType, guard: f64, name: &str) -> CellLib {
    let mut lib = CellLib::new(name);
    lib.insert_cell(one_input_cell(
        "INV_X1",
        TimingSense::NegativeUnate,
        3.0 * scale,
        1.0,
    ));
    lib.insert_cell(one_input_cell(
        "INV_X2",
        TimingSense::NegativeUnate,
        2.2 * scale,
        1.5,
    ));
    lib.insert_cell(one_input_cell(
        "INV_X3",
        TimingSense::NegativeUnate,
        1.8 * scale,
        2.0,
    ));
    lib.insert_cell(one_input_cell(
        "BUF_X2",
        TimingSense::PositiveUnate,
        2.5 * scale,
        1.2,
    ));
    lib.insert_cell(nand2("NAND2_X1", 3.5 * scale, 1.0));
    lib.insert_cell(nand2("NAND2_X2", 2.8 * scale, 1.4));
    lib.insert_cell(dff("DFF_X1", 4.0 * scale, constraint_kind, guard));
    lib
}

/// The early/late library pair: early tables are optimistic scalings of
/// the late ones; the early D-pin arc is the hold check and the late one
/// the setup check.
pub fn libs() -> (CellLib, CellLib) {
    (
        build_lib(0.8, TimingType::HoldRising, 0.4, "sample_Early"),
        build_lib(1.0, TimingType::SetupRising, 2.0, "sample_Late"),
    )
}

/// The ISCAS c17 sample: five inputs, two outputs, six NAND2 gates.
pub fn c17() -> Timer {
    let (early, late) = libs();
    let mut t = Timer::new(early, late);
    t.set_name("c17");

    for pi in ["nx1", "nx2", "nx3", "nx6", "nx7"] {
        t.insert_primary_input(pi).unwrap();
    }
    for po in ["nx22", "nx23"] {
        t.insert_primary_output(po).unwrap();
    }
    for wire in ["n10", "n11", "n16", "n19"] {
        t.insert_net(wire).unwrap();
    }
    for gate in ["inst_0", "inst_1", "inst_2", "inst_3", "inst_4", "inst_5"] {
        t.insert_gate(gate, "NAND2_X1").unwrap();
    }
    let wiring = [
        ("inst_0", "nx1", "nx3", "n10"),
        ("inst_1", "nx3", "nx6", "n11"),
        ("inst_2", "nx2", "n11", "n16"),
        ("inst_3", "n11", "nx7", "n19"),
        ("inst_4", "n10", "n16", "nx22"),
        ("inst_5", "n16", "n19", "nx23"),
    ];
    for (gate, a, b, o) in wiring {
        t.connect_pin(&format!("{gate}:a"), a).unwrap();
        t.connect_pin(&format!("{gate}:b"), b).unwrap();
        t.connect_pin(&format!("{gate}:o"), o).unwrap();
    }

    let assertions = TimingAssertions {
        clocks: Vec::new(),
        ats: ["nx1", "nx2", "nx3", "nx6", "nx7"]
            .into_iter()
            .map(|pi| (pi.to_string(), SplitTrans::splat(0.0)))
            .collect(),
        slews: ["nx1", "nx2", "nx3", "nx6", "nx7"]
            .into_iter()
            .map(|pi| (pi.to_string(), SplitTrans::splat(1.0)))
            .collect(),
        rats: ["nx22", "nx23"]
            .into_iter()
            .map(|po| {
                let rat =
                    SplitTrans::from_fn(|el, _| if el == Split::Late { 6.0 } else { 0.0 });
                (po.to_string(), rat)
            })
            .collect(),
        loads: ["nx22", "nx23"]
            .into_iter()
            .map(|po| (po.to_string(), 1.0))
            .collect(),
    };
    t.apply_assertions(&assertions).unwrap();
    t
}

/// The small sequential sample: NAND into a flip-flop into two
/// inverters driving the output.
pub fn simple(period: f64) -> Timer {
    let (early, late) = libs();
    let mut t = Timer::new(early, late);
    t.set_name("simple");

    for pi in ["inp1", "inp2", "tau2015_clk"] {
        t.insert_primary_input(pi).unwrap();
    }
    t.insert_primary_output("out").unwrap();
    for wire in ["n1", "n2", "n3"] {
        t.insert_net(wire).unwrap();
    }
    t.insert_gate("u1", "NAND2_X1").unwrap();
    t.insert_gate("f1", "DFF_X1").unwrap();
    t.insert_gate("u2", "INV_X1").unwrap();
    t.insert_gate("u3", "INV_X2").unwrap();

    t.connect_pin("u1:a", "inp1").unwrap();
    t.connect_pin("u1:b", "inp2").unwrap();
    t.connect_pin("u1:o", "n1").unwrap();
    t.connect_pin("f1:d", "n1").unwrap();
    t.connect_pin("f1:ck", "tau2015_clk").unwrap();
    t.connect_pin("f1:q", "n2").unwrap();
    t.connect_pin("u2:a", "n2").unwrap();
    t.connect_pin("u2:o", "n3").unwrap();
    t.connect_pin("u3:a", "n3").unwrap();
    t.connect_pin("u3:o", "out").unwrap();

    let assertions = TimingAssertions {
        clocks: vec![("tau2015_clk".to_string(), period)],
        ats: ["inp1", "inp2"]
            .into_iter()
            .map(|pi| (pi.to_string(), SplitTrans::splat(0.0)))
            .collect(),
        slews: ["inp1", "inp2", "tau2015_clk"]
            .into_iter()
            .map(|pi| (pi.to_string(), SplitTrans::splat(1.0)))
            .collect(),
        rats: vec![(
            "out".to_string(),
            SplitTrans::from_fn(|el, _| if el == Split::Late { 8.0 } else { 0.0 }),
        )],
        loads: vec![("out".to_string(), 1.0)],
    };
    t.apply_assertions(&assertions).unwrap();
    t
}

/// Parasitics for the rerouted `TAUNET_1` in the c17 scenario.
pub fn taunet_parasitics() -> ParasiticsDesc {
    ParasiticsDesc {
        caps: vec![("nx6".to_string(), 0.1), ("TAUGATE_1:a".to_string(), 0.2)],
        segments: vec![("nx6".to_string(), "TAUGATE_1:a".to_string(), 2.0)],
    }
}

/// Parasitics for the re-driven `nx6` net in the c17 scenario.
pub fn nx6_parasitics() -> ParasiticsDesc {
    ParasiticsDesc {
        caps: vec![
            ("TAUGATE_1:o".to_string(), 0.1),
            ("inst_1:b".to_string(), 0.3),
        ],
        segments: vec![("TAUGATE_1:o".to_string(), "inst_1:b".to_string(), 1.5)],
    }
}
