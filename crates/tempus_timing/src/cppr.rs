//! Common-path pessimism removal.
//!
//! A sequential check pairs a launch path on one split with a capture
//! clock path on the opposite split. Where the two clock paths share a
//! prefix from the clock root, the early/late spread of that prefix is
//! counted twice; the credit computed here is the spread at the deepest
//! parity-matched common node, and it is added back onto the endpoint's
//! slack.
//!
//! Backward walks follow the dominant fanin recorded during arrival
//! relaxation. Outside the clock tree the launch walk takes jump
//! shortcuts across unbranching chains whenever a jump reproduces the
//! head's arrival; inside the clock tree walks step edge by edge so the
//! divergence point is exact.

use crate::ids::{NodeId, PinId, TestId};
use crate::test::TestKind;
use crate::timer::Timer;
use tempus_common::{Split, Trans};

/// Relative tolerance for matching a jump's condensed delay against the
/// relaxed arrival it shortcuts.
const JUMP_MATCH_TOL: f64 = 1e-9;

/// The CPPR credit for one endpoint, computed along the dominant launch
/// path. Nonnegative; zero when the clock paths never converge with
/// matching parity or either arrival is undefined.
pub(crate) fn credit(timer: &Timer, tid: TestId, el: Split, d_rf: Trans, ck_rf: Trans) -> f64 {
    let TestKind::Sequential {
        related,
        constrained,
        ..
    } = timer.tests[tid].kind
    else {
        return 0.0;
    };
    let d_node = timer.pins[constrained].node;
    let Some((entry, entry_rf)) = clock_entry_of_launch(timer, d_node, el, d_rf) else {
        return 0.0;
    };
    let launch = walk_in_clock(timer, entry, entry_rf, el);
    credit_against_capture(timer, related, ck_rf, el.flip(), &launch)
}

/// The CPPR credit for one concrete data-path trace (endpoint first), as
/// used during path enumeration.
pub(crate) fn credit_for_trace(
    timer: &Timer,
    tid: TestId,
    el: Split,
    trace: &[(NodeId, Trans)],
) -> f64 {
    let TestKind::Sequential { related, .. } = timer.tests[tid].kind else {
        return 0.0;
    };
    let Some(&(_, d_rf)) = trace.first() else {
        return 0.0;
    };
    let Some(ck_rf) = timer.tests[tid].ck_rf[(el, d_rf)] else {
        return 0.0;
    };
    // The trace runs endpoint -> source; its clock prefix is the maximal
    // run of clock-tree nodes at the source end.
    let launch: Vec<(NodeId, Trans)> = trace
        .iter()
        .rev()
        .take_while(|&&(n, _)| timer.clock.contains(n))
        .copied()
        .collect();
    if launch.is_empty() {
        return 0.0;
    }
    credit_against_capture(timer, related, ck_rf, el.flip(), &launch)
}

/// Shared tail: walk the capture clock path and price the common prefix.
fn credit_against_capture(
    timer: &Timer,
    related: PinId,
    ck_rf: Trans,
    capture_el: Split,
    launch_root_first: &[(NodeId, Trans)],
) -> f64 {
    let c_node = timer.pins[related].node;
    let capture = walk_in_clock(timer, c_node, ck_rf, capture_el);
    let launch = launch_root_first;

    let mut common: Option<(NodeId, Trans)> = None;
    for (a, b) in launch.iter().zip(capture.iter()) {
        if a != b {
            break;
        }
        common = Some(*a);
    }
    let Some((z, zrf)) = common else {
        return 0.0;
    };

    let late = timer.nodes[z].at[(Split::Late, zrf)];
    let early = timer.nodes[z].at[(Split::Early, zrf)];
    if !late.is_finite() || !early.is_finite() {
        return 0.0;
    }
    (late - early).max(0.0)
}

/// Walks the dominant launch path backward from the data pin until it
/// enters the clock tree, taking jump shortcuts where legal. Returns the
/// clock-tree entry point, or `None` for paths launched from an
/// unclocked source.
fn clock_entry_of_launch(
    timer: &Timer,
    from: NodeId,
    el: Split,
    rf: Trans,
) -> Option<(NodeId, Trans)> {
    let mut v = from;
    let mut vrf = rf;
    loop {
        if timer.clock.contains(v) {
            return Some((v, vrf));
        }
        if let Some((tail, trf)) = jump_shortcut(timer, v, el, vrf) {
            v = tail;
            vrf = trf;
            continue;
        }
        let (eid, irf) = timer.nodes[v].at_from[(el, vrf)]?;
        v = timer.edges[eid].from;
        vrf = irf;
    }
}

/// A jump whose condensed delay reproduces the head's relaxed arrival
/// lies on a dominant path and may replace the edge-by-edge walk.
fn jump_shortcut(timer: &Timer, head: NodeId, el: Split, rf: Trans) -> Option<(NodeId, Trans)> {
    let head_at = timer.nodes[head].at[(el, rf)];
    if !head_at.is_finite() {
        return None;
    }
    for &jid in &timer.nodes[head].jumpin {
        let jump = &timer.jumps[jid];
        let trf = jump.tail_trans(rf);
        let tail_at = timer.nodes[jump.from].at[(el, trf)];
        if !tail_at.is_finite() {
            continue;
        }
        let err = (tail_at + jump.delay[(el, rf)] - head_at).abs();
        if err <= JUMP_MATCH_TOL * head_at.abs().max(1.0) {
            return Some((jump.from, trf));
        }
    }
    None
}

/// Walks the dominant fanin chain backward within the clock tree from
/// `(start, rf)` to the clock root. Returns the walk root-first.
fn walk_in_clock(timer: &Timer, start: NodeId, rf: Trans, el: Split) -> Vec<(NodeId, Trans)> {
    let mut walk = vec![(start, rf)];
    let mut v = start;
    let mut vrf = rf;
    while let Some((eid, irf)) = timer.nodes[v].at_from[(el, vrf)] {
        let u = timer.edges[eid].from;
        if !timer.clock.contains(u) {
            break;
        }
        walk.push((u, irf));
        v = u;
        vrf = irf;
    }
    walk.reverse();
    walk
}
