//! Netlist entities: pins, nets, gates, and primary I/O ports.
//!
//! A pin is the finest electrical endpoint — a cellpin of a gate instance,
//! a primary input port, or a primary output port. Every pin owns exactly
//! one timing-graph node. A net connects one driver (root) pin to zero or
//! more sink (leaf) pins and optionally carries an RC tree loaded from
//! parasitics.

use crate::ids::{GateId, NetId, NodeId, PinId, RcNodeId, TestId};
use crate::rctree::RcTree;
use serde::{Deserialize, Serialize};
use tempus_common::{Ident, Split, SplitTrans, Trans};

/// The direction of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// An input cellpin of a gate.
    Input,
    /// An output cellpin of a gate.
    Output,
    /// A primary input port of the design.
    PrimaryInput,
    /// A primary output port of the design.
    PrimaryOutput,
}

impl PinDirection {
    /// Returns `true` if a pin of this direction drives its net, i.e.
    /// roots the net's RC tree.
    pub fn is_net_root(self) -> bool {
        matches!(self, PinDirection::Output | PinDirection::PrimaryInput)
    }
}

/// A pin of the design.
#[derive(Debug)]
pub struct Pin {
    /// Interned full pin name (`"<gate>:<cellpin>"` or a port name).
    pub name: Ident,
    /// Direction of the pin.
    pub direction: PinDirection,
    /// The timing-graph node attached to this pin.
    pub node: NodeId,
    /// The gate this pin belongs to, for cellpins.
    pub gate: Option<GateId>,
    /// Index of the matching cellpin within the gate's cell, for cellpins.
    ///
    /// The early and late cells are structurally identical, so one index
    /// resolves the cellpin in either split's library.
    pub cellpin: Option<usize>,
    /// The net this pin is connected to, if any.
    pub net: Option<NetId>,
    /// The RC-tree node bound to this pin within its net's tree, if any.
    pub rc_node: Option<RcNodeId>,
    /// The timing test constraining this pin, if any.
    pub test: Option<TestId>,
}

impl Pin {
    /// Creates an unconnected pin attached to `node`.
    pub fn new(name: Ident, direction: PinDirection, node: NodeId) -> Self {
        Self {
            name,
            direction,
            node,
            gate: None,
            cellpin: None,
            net: None,
            rc_node: None,
            test: None,
        }
    }

    /// Returns `true` if this pin roots its net's RC tree.
    pub fn is_net_root(&self) -> bool {
        self.direction.is_net_root()
    }
}

/// A net: one driver pin and a set of sink pins, with optional parasitics.
#[derive(Debug)]
pub struct Net {
    /// Interned net name.
    pub name: Ident,
    /// The driver (root) pin, if one is connected.
    pub root: Option<PinId>,
    /// All connected pins, including the root.
    pub pins: Vec<PinId>,
    /// Total sink-side capacitance, per split and transition.
    pub total_leaf_cap: SplitTrans<f64>,
    /// The RC tree loaded from parasitics, if any.
    pub rctree: Option<RcTree>,
}

impl Net {
    /// Creates an empty net.
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            root: None,
            pins: Vec::new(),
            total_leaf_cap: SplitTrans::splat(0.0),
            rctree: None,
        }
    }

    /// The load this net presents to its driver: the RC tree's downstream
    /// capacitance at the root when parasitics are loaded, otherwise the
    /// lumped sink capacitance.
    pub fn load(&self, el: Split, rf: Trans) -> f64 {
        match &self.rctree {
            Some(tree) => tree.root_load(el, rf).unwrap_or(self.total_leaf_cap[(el, rf)]),
            None => self.total_leaf_cap[(el, rf)],
        }
    }

    /// Number of connected pins.
    pub fn num_pins(&self) -> usize {
        self.pins.len()
    }
}

/// A gate instance bound to one cell in each split library.
#[derive(Debug)]
pub struct Gate {
    /// Interned instance name.
    pub name: Ident,
    /// Name of the bound library cell, identical across both splits.
    pub cell_name: String,
    /// Pins of this instance, in cellpin declaration order.
    pub pins: Vec<PinId>,
}

/// A primary input port and its asserted boundary timing.
#[derive(Debug)]
pub struct PrimaryInput {
    /// Interned port name.
    pub name: Ident,
    /// The pin bound to this port.
    pub pin: PinId,
    /// Asserted arrival time per split and transition.
    pub at: SplitTrans<f64>,
    /// Asserted transition time per split and transition.
    pub slew: SplitTrans<f64>,
}

impl PrimaryInput {
    /// Creates a port with zero arrival and slew on all four pairs.
    pub fn new(name: Ident, pin: PinId) -> Self {
        Self {
            name,
            pin,
            at: SplitTrans::splat(0.0),
            slew: SplitTrans::splat(0.0),
        }
    }
}

/// A primary output port and its asserted boundary timing.
#[derive(Debug)]
pub struct PrimaryOutput {
    /// Interned port name.
    pub name: Ident,
    /// The pin bound to this port.
    pub pin: PinId,
    /// Asserted required arrival time per split and transition; undefined
    /// until asserted.
    pub rat: SplitTrans<f64>,
    /// Asserted load capacitance per split and transition.
    pub load: SplitTrans<f64>,
}

impl PrimaryOutput {
    /// Creates a port with undefined required times and zero load.
    pub fn new(name: Ident, pin: PinId) -> Self {
        Self {
            name,
            pin,
            rat: SplitTrans::from_fn(|el, _| el.undefined_rat()),
            load: SplitTrans::splat(0.0),
        }
    }
}

/// The structured form of an initial I/O timing description.
///
/// This is the engine-side shape of a parsed `.timing` file: arrival and
/// slew assertions on primary inputs, required-time and load assertions on
/// primary outputs, and at most one clock declaration. Values are in the
/// library's units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingAssertions {
    /// `(port, period)` clock declarations; the port becomes the clock root.
    pub clocks: Vec<(String, f64)>,
    /// Per-PI arrival assertions.
    pub ats: Vec<(String, SplitTrans<f64>)>,
    /// Per-PI slew assertions.
    pub slews: Vec<(String, SplitTrans<f64>)>,
    /// Per-PO required-time assertions.
    pub rats: Vec<(String, SplitTrans<f64>)>,
    /// Per-PO scalar load assertions, replicated over all four pairs.
    pub loads: Vec<(String, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_root_directions() {
        assert!(PinDirection::Output.is_net_root());
        assert!(PinDirection::PrimaryInput.is_net_root());
        assert!(!PinDirection::Input.is_net_root());
        assert!(!PinDirection::PrimaryOutput.is_net_root());
    }

    #[test]
    fn net_load_without_parasitics() {
        let mut net = Net::new(Ident::from_raw(0));
        net.total_leaf_cap[(Split::Late, Trans::Rise)] = 3.5;
        assert_eq!(net.load(Split::Late, Trans::Rise), 3.5);
        assert_eq!(net.load(Split::Early, Trans::Fall), 0.0);
    }

    #[test]
    fn primary_output_defaults() {
        use tempus_common::ArenaId;
        let po = PrimaryOutput::new(Ident::from_raw(0), PinId::from_raw(0));
        assert_eq!(po.rat[(Split::Early, Trans::Rise)], f64::NEG_INFINITY);
        assert_eq!(po.rat[(Split::Late, Trans::Rise)], f64::INFINITY);
        assert_eq!(po.load[(Split::Late, Trans::Fall)], 0.0);
    }

    #[test]
    fn assertions_serde_roundtrip() {
        let a = TimingAssertions {
            clocks: vec![("tau2015_clk".into(), 45.0)],
            ats: vec![("inp1".into(), SplitTrans::splat(0.0))],
            ..Default::default()
        };
        let json = serde_json::to_string(&a).unwrap();
        let back: TimingAssertions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.clocks.len(), 1);
        assert_eq!(back.clocks[0].1, 45.0);
    }
}
