//! Per-net RC interconnect trees: Elmore delay and PERI slew.
//!
//! Each net with loaded parasitics carries one RC tree rooted at the
//! driver pin's node. The solver runs three tree traversals from the
//! root:
//!
//! 1. post-order capacitance sum-up (`load`),
//! 2. pre-order Elmore delay (`delay = parent delay + res · load`),
//! 3. post-order cap-weighted delay moments (`ldelay`) followed by a
//!    pre-order second-moment pass (`beta`, `impulse = 2·beta − delay²`).
//!
//! The slew at a tap for input slew `s` is `sign(s)·√(s² + impulse)`.

use crate::error::{TimingError, TimingResult};
use crate::ids::{PinId, RcNodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tempus_common::{split_trans, Arena, Ident, Split, SplitTrans, Trans};

/// A parasitic node of an RC tree.
#[derive(Debug)]
pub struct RcNode {
    /// Interned node name; pins are bound to the node of the same name.
    pub name: Ident,
    /// The design pin bound to this node, if any.
    pub pin: Option<PinId>,
    /// Lumped capacitance, including the bound pin's capacitance on taps.
    pub cap: SplitTrans<f64>,
    /// Downstream capacitance seen from this node.
    pub load: SplitTrans<f64>,
    /// Elmore delay from the root.
    pub delay: SplitTrans<f64>,
    /// Cap-weighted downstream delay moment.
    pub ldelay: SplitTrans<f64>,
    /// Second moment accumulated from the root.
    pub beta: SplitTrans<f64>,
    /// Slew impulse: `2·beta − delay²`.
    pub impulse: SplitTrans<f64>,
}

impl RcNode {
    fn new(name: Ident, cap: f64) -> Self {
        Self {
            name,
            pin: None,
            cap: SplitTrans::splat(cap),
            load: SplitTrans::splat(0.0),
            delay: SplitTrans::splat(0.0),
            ldelay: SplitTrans::splat(0.0),
            beta: SplitTrans::splat(0.0),
            impulse: SplitTrans::splat(0.0),
        }
    }
}

/// An undirected resistor segment between two RC nodes.
#[derive(Debug, Clone, Copy)]
pub struct RcSegment {
    /// One endpoint.
    pub u: RcNodeId,
    /// The other endpoint.
    pub v: RcNodeId,
    /// Segment resistance.
    pub res: f64,
}

/// The parsed form of one net's parasitics, as produced by an external
/// SPEF reader: named node capacitances and resistor segments. Nodes
/// whose names match pins connected to the net are bound to those pins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParasiticsDesc {
    /// `(node, capacitance)` pairs; node names may repeat pin names.
    pub caps: Vec<(String, f64)>,
    /// `(node, node, resistance)` segments.
    pub segments: Vec<(String, String, f64)>,
}

/// One net's RC tree.
#[derive(Debug, Default)]
pub struct RcTree {
    nodes: Arena<RcNodeId, RcNode>,
    names: HashMap<Ident, RcNodeId>,
    segments: Vec<RcSegment>,
    /// The node bound to the net's driver pin.
    pub root: Option<RcNodeId>,
}

impl RcTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node with the given lumped capacitance, or adds the
    /// capacitance onto an existing node of the same name.
    pub fn insert_node(&mut self, name: Ident, cap: f64) -> RcNodeId {
        match self.names.get(&name) {
            Some(&id) => {
                for (el, rf) in split_trans() {
                    self.nodes[id].cap[(el, rf)] += cap;
                }
                id
            }
            None => {
                let id = self.nodes.insert(RcNode::new(name, cap));
                self.names.insert(name, id);
                id
            }
        }
    }

    /// Inserts a resistor segment, creating zero-cap endpoints as needed.
    pub fn insert_segment(&mut self, a: Ident, b: Ident, res: f64) {
        let u = self.node_or_insert(a);
        let v = self.node_or_insert(b);
        self.segments.push(RcSegment { u, v, res });
    }

    fn node_or_insert(&mut self, name: Ident) -> RcNodeId {
        match self.names.get(&name) {
            Some(&id) => id,
            None => self.insert_node(name, 0.0),
        }
    }

    /// Looks up a node by name.
    pub fn node_by_name(&self, name: Ident) -> Option<RcNodeId> {
        self.names.get(&name).copied()
    }

    /// Returns a node by ID.
    pub fn node(&self, id: RcNodeId) -> Option<&RcNode> {
        self.nodes.get(id)
    }

    /// Returns a mutable node by ID.
    pub fn node_mut(&mut self, id: RcNodeId) -> Option<&mut RcNode> {
        self.nodes.get_mut(id)
    }

    /// Number of nodes in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Adds `delta` to a node's capacitance on one split/transition pair.
    pub fn add_cap(&mut self, id: RcNodeId, el: Split, rf: Trans, delta: f64) {
        self.nodes[id].cap[(el, rf)] += delta;
    }

    /// Renames a node, keeping its ID. Used when a driver is spliced in
    /// and the root RC node takes the new driver pin's name.
    pub fn rehash_node(&mut self, old: Ident, new: Ident) {
        if let Some(id) = self.names.remove(&old) {
            self.names.insert(new, id);
            self.nodes[id].name = new;
        }
    }

    /// The tree's downstream capacitance at the root, valid after
    /// [`update_rc_timing`](Self::update_rc_timing).
    pub fn root_load(&self, el: Split, rf: Trans) -> Option<f64> {
        let root = self.root?;
        Some(self.nodes.get(root)?.load[(el, rf)])
    }

    /// Elmore delay from the root to `id`.
    pub fn delay(&self, id: RcNodeId, el: Split, rf: Trans) -> f64 {
        self.nodes[id].delay[(el, rf)]
    }

    /// PERI slew at `id` for root input slew `si`.
    ///
    /// Non-finite input slews (undefined sentinels) pass through.
    pub fn slew(&self, id: RcNodeId, el: Split, rf: Trans, si: f64) -> f64 {
        if !si.is_finite() {
            return si;
        }
        si.signum() * (si * si + self.nodes[id].impulse[(el, rf)]).sqrt()
    }

    /// Recomputes load, delay, and slew impulse over the whole tree.
    ///
    /// Fails with [`TimingError::BadTopology`] when the segments do not
    /// form a single tree spanning every node, or no root is bound.
    pub fn update_rc_timing(&mut self) -> TimingResult<()> {
        let root = self
            .root
            .ok_or_else(|| TimingError::BadTopology("rc tree has no root pin".to_string()))?;

        // Adjacency over the live nodes.
        let mut adj: HashMap<RcNodeId, Vec<(RcNodeId, f64)>> = HashMap::new();
        for seg in &self.segments {
            adj.entry(seg.u).or_default().push((seg.v, seg.res));
            adj.entry(seg.v).or_default().push((seg.u, seg.res));
        }

        // Root the tree with a BFS; `order` ends up top-down.
        let mut order: Vec<RcNodeId> = Vec::with_capacity(self.nodes.len());
        let mut parent: HashMap<RcNodeId, (RcNodeId, f64)> = HashMap::new();
        let mut visited: HashMap<RcNodeId, bool> = HashMap::new();
        order.push(root);
        visited.insert(root, true);
        let mut head = 0;
        while head < order.len() {
            let u = order[head];
            head += 1;
            for &(v, res) in adj.get(&u).into_iter().flatten() {
                if visited.get(&v).copied().unwrap_or(false) {
                    // The BFS parent is expected once; any other revisit
                    // closes a cycle.
                    if parent.get(&u).map(|&(p, _)| p) != Some(v) {
                        return Err(TimingError::BadTopology(
                            "rc network contains a resistive loop".to_string(),
                        ));
                    }
                    continue;
                }
                visited.insert(v, true);
                parent.insert(v, (u, res));
                order.push(v);
            }
        }

        if order.len() != self.nodes.len() {
            return Err(TimingError::BadTopology(
                "rc network is disconnected from its root".to_string(),
            ));
        }

        for (el, rf) in split_trans() {
            // Pass 1: downstream capacitance, bottom-up.
            for &v in order.iter() {
                let node = &mut self.nodes[v];
                node.load[(el, rf)] = node.cap[(el, rf)];
            }
            for &v in order.iter().rev() {
                if let Some(&(p, _)) = parent.get(&v) {
                    let load = self.nodes[v].load[(el, rf)];
                    self.nodes[p].load[(el, rf)] += load;
                }
            }

            // Pass 2: Elmore delay, top-down.
            self.nodes[root].delay[(el, rf)] = 0.0;
            for &v in order.iter().skip(1) {
                let (p, res) = parent[&v];
                let d = self.nodes[p].delay[(el, rf)] + res * self.nodes[v].load[(el, rf)];
                self.nodes[v].delay[(el, rf)] = d;
            }

            // Pass 3: cap-weighted delay moment, bottom-up.
            for &v in order.iter() {
                let node = &mut self.nodes[v];
                node.ldelay[(el, rf)] = node.cap[(el, rf)] * node.delay[(el, rf)];
            }
            for &v in order.iter().rev() {
                if let Some(&(p, _)) = parent.get(&v) {
                    let ld = self.nodes[v].ldelay[(el, rf)];
                    self.nodes[p].ldelay[(el, rf)] += ld;
                }
            }

            // Pass 4: second moment and slew impulse, top-down.
            self.nodes[root].beta[(el, rf)] = 0.0;
            self.nodes[root].impulse[(el, rf)] = 0.0;
            for &v in order.iter().skip(1) {
                let (p, res) = parent[&v];
                let beta = self.nodes[p].beta[(el, rf)] + res * self.nodes[v].ldelay[(el, rf)];
                let node = &mut self.nodes[v];
                node.beta[(el, rf)] = beta;
                let d = node.delay[(el, rf)];
                node.impulse[(el, rf)] = 2.0 * beta - d * d;
            }
        }

        Ok(())
    }
}
