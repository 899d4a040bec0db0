//! The timing graph: nodes, edges, and jumps.
//!
//! One node per pin; directed edges of three kinds (net arcs derived from
//! RC trees, combinational cell arcs, and constraint arcs that never
//! propagate arrival times); and jumps, the transitive shortcuts that
//! condense unbranching chains for fast common-path traversal.

use crate::ids::{EdgeId, JumpId, NetId, NodeId, PinId, TestId};
use tempus_celllib::TimingSense;
use tempus_common::{Split, SplitTrans, Trans};

/// Per-edge delay, indexed by split, input transition, and output
/// transition. `None` marks a transition pair the edge does not define.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDelay([[[Option<f64>; 2]; 2]; 2]);

impl EdgeDelay {
    /// Creates a delay table with every pair undefined.
    pub fn undefined() -> Self {
        Self::default()
    }

    /// Creates a delay table with zero delay on the transition-preserving
    /// pairs, the initial state of a net arc with no parasitics.
    pub fn zero_preserving() -> Self {
        let mut d = Self::default();
        for el in Split::ALL {
            for rf in Trans::ALL {
                d.set(el, rf, rf, Some(0.0));
            }
        }
        d
    }

    /// Returns the delay for `(el, irf, orf)`, if defined.
    pub fn get(&self, el: Split, irf: Trans, orf: Trans) -> Option<f64> {
        self.0[el.index()][irf.index()][orf.index()]
    }

    /// Sets the delay for `(el, irf, orf)`.
    pub fn set(&mut self, el: Split, irf: Trans, orf: Trans, delay: Option<f64>) {
        self.0[el.index()][irf.index()][orf.index()] = delay;
    }
}

/// What an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// A net arc from the driver to one sink; delay comes from the net's
    /// RC tree and the transition is preserved.
    Net(NetId),
    /// A combinational cell arc; `arc` indexes the timing arcs of the
    /// sink pin's cellpin.
    Comb {
        /// Index into the sink cellpin's timing arcs.
        arc: usize,
    },
    /// A setup/hold constraint arc; carries no delay and never propagates
    /// arrival times.
    Constraint {
        /// The test this arc feeds.
        test: TestId,
    },
}

impl EdgeKind {
    /// Returns `true` for constraint arcs.
    pub fn is_constraint(&self) -> bool {
        matches!(self, EdgeKind::Constraint { .. })
    }
}

/// A directed timing-graph edge.
#[derive(Debug)]
pub struct Edge {
    /// Source node.
    pub from: NodeId,
    /// Sink node.
    pub to: NodeId,
    /// What the edge represents.
    pub kind: EdgeKind,
    /// Unateness; net arcs are positive unate.
    pub sense: TimingSense,
    /// Cached per-transition delay, refreshed by the delay pass.
    pub delay: EdgeDelay,
}

/// A transitive shortcut summarizing a unique unbranching chain from a
/// tail node to a downstream head node.
#[derive(Debug)]
pub struct Jump {
    /// The upstream tail.
    pub from: NodeId,
    /// The downstream head.
    pub to: NodeId,
    /// Number of signal inversions accumulated along the chain.
    pub negs: u32,
    /// Accumulated chain delay per split, indexed by the transition seen
    /// at the head; the tail transition is the head transition flipped
    /// `negs` times.
    pub delay: SplitTrans<f64>,
}

impl Jump {
    /// Returns `true` if the chain inverts the signal.
    pub fn inverting(&self) -> bool {
        self.negs % 2 == 1
    }

    /// The tail transition corresponding to head transition `rf`.
    pub fn tail_trans(&self, rf: Trans) -> Trans {
        rf.xor(self.inverting())
    }
}

/// A timing-graph node, one per pin.
#[derive(Debug)]
pub struct Node {
    /// The pin this node is attached to.
    pub pin: PinId,
    /// Topological level over non-constraint edges.
    pub level: i32,
    /// Arrival time per split and transition.
    pub at: SplitTrans<f64>,
    /// Transition time per split and transition.
    pub slew: SplitTrans<f64>,
    /// Required arrival time per split and transition.
    pub rat: SplitTrans<f64>,
    /// Whether the arrival was propagated from the clock root.
    pub at_clocked: SplitTrans<bool>,
    /// The fanin edge and input transition that produced the arrival.
    pub at_from: SplitTrans<Option<(EdgeId, Trans)>>,
    /// Incoming edges.
    pub fanin: Vec<EdgeId>,
    /// Outgoing edges.
    pub fanout: Vec<EdgeId>,
    /// Jumps ending at this node.
    pub jumpin: Vec<JumpId>,
    /// Jumps starting at this node.
    pub jumpout: Vec<JumpId>,
    /// Position within the frontier pipeline's level list, when enqueued.
    pub pipeline_slot: Option<u32>,
}

impl Node {
    /// Creates a level-zero node with undefined timing.
    pub fn new(pin: PinId) -> Self {
        Self {
            pin,
            level: 0,
            at: SplitTrans::from_fn(|el, _| el.undefined_at()),
            slew: SplitTrans::from_fn(|el, _| el.undefined_slew()),
            rat: SplitTrans::from_fn(|el, _| el.undefined_rat()),
            at_clocked: SplitTrans::splat(false),
            at_from: SplitTrans::splat(None),
            fanin: Vec::new(),
            fanout: Vec::new(),
            jumpin: Vec::new(),
            jumpout: Vec::new(),
            pipeline_slot: None,
        }
    }

    /// Resets arrivals to the relaxation identities.
    pub fn reset_at(&mut self) {
        self.at = SplitTrans::from_fn(|el, _| el.undefined_at());
        self.at_clocked = SplitTrans::splat(false);
        self.at_from = SplitTrans::splat(None);
    }

    /// Resets slews to the relaxation identities.
    pub fn reset_slew(&mut self) {
        self.slew = SplitTrans::from_fn(|el, _| el.undefined_slew());
    }

    /// Resets required times to the relaxation identities.
    pub fn reset_rat(&mut self) {
        self.rat = SplitTrans::from_fn(|el, _| el.undefined_rat());
    }

    /// Timing slack at this node: `rat - at` on the late split, `at - rat`
    /// on the early split, positive meaning safe. `+INF` when either side
    /// is undefined.
    pub fn slack(&self, el: Split, rf: Trans) -> f64 {
        let at = self.at[(el, rf)];
        let rat = self.rat[(el, rf)];
        if !at.is_finite() || !rat.is_finite() {
            return f64::INFINITY;
        }
        match el {
            Split::Early => at - rat,
            Split::Late => rat - at,
        }
    }

    /// Number of fanin edges.
    pub fn num_fanins(&self) -> usize {
        self.fanin.len()
    }

    /// Number of fanout edges.
    pub fn num_fanouts(&self) -> usize {
        self.fanout.len()
    }

    /// Returns `true` while the node is enqueued in the frontier pipeline.
    pub fn in_pipeline(&self) -> bool {
        self.pipeline_slot.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempus_common::ArenaId;

    #[test]
    fn new_node_has_undefined_timing() {
        let node = Node::new(PinId::from_raw(0));
        assert_eq!(node.at[(Split::Early, Trans::Rise)], f64::INFINITY);
        assert_eq!(node.at[(Split::Late, Trans::Rise)], f64::NEG_INFINITY);
        assert_eq!(node.rat[(Split::Late, Trans::Fall)], f64::INFINITY);
        assert_eq!(node.slack(Split::Late, Trans::Rise), f64::INFINITY);
    }

    #[test]
    fn slack_signs() {
        let mut node = Node::new(PinId::from_raw(0));
        node.at[(Split::Late, Trans::Rise)] = 8.0;
        node.rat[(Split::Late, Trans::Rise)] = 10.0;
        node.at[(Split::Early, Trans::Rise)] = 3.0;
        node.rat[(Split::Early, Trans::Rise)] = 1.0;
        // Late: arrives before required, safe.
        assert_eq!(node.slack(Split::Late, Trans::Rise), 2.0);
        // Early: arrives after the earliest allowed, safe.
        assert_eq!(node.slack(Split::Early, Trans::Rise), 2.0);
    }

    #[test]
    fn edge_delay_defaults() {
        let d = EdgeDelay::undefined();
        assert_eq!(d.get(Split::Early, Trans::Rise, Trans::Rise), None);
        let z = EdgeDelay::zero_preserving();
        assert_eq!(z.get(Split::Late, Trans::Fall, Trans::Fall), Some(0.0));
        assert_eq!(z.get(Split::Late, Trans::Rise, Trans::Fall), None);
    }

    #[test]
    fn jump_parity() {
        let j = Jump {
            from: NodeId::from_raw(0),
            to: NodeId::from_raw(1),
            negs: 3,
            delay: SplitTrans::splat(1.0),
        };
        assert!(j.inverting());
        assert_eq!(j.tail_trans(Trans::Rise), Trans::Fall);
        let k = Jump {
            from: NodeId::from_raw(0),
            to: NodeId::from_raw(1),
            negs: 2,
            delay: SplitTrans::splat(1.0),
        };
        assert_eq!(k.tail_trans(Trans::Rise), Trans::Rise);
    }
}
