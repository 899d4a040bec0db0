//! The derived clock tree.
//!
//! A BFS from the designated clock primary input over non-constraint
//! edges records, for every reachable node, which inversion parities of
//! the clock phase can arrive there. Membership and parity feed jump
//! legality, test updates, and common-path pessimism removal.

use crate::graph::Edge;
use crate::ids::{EdgeId, NodeId, PinId};
use std::collections::HashMap;
use std::collections::VecDeque;
use tempus_celllib::TimingSense;
use tempus_common::Arena;

use crate::graph::Node;

const EVEN: u8 = 0b01;
const ODD: u8 = 0b10;

/// The clock tree rooted at the clock primary input.
#[derive(Debug, Default)]
pub struct ClockTree {
    /// The clock root pin, if a clock has been declared.
    pub root_pin: Option<PinId>,
    /// The declared clock period.
    pub period: f64,
    members: HashMap<NodeId, u8>,
    depth: i32,
    dirty: bool,
}

impl ClockTree {
    /// Creates an empty clock tree with no declared clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the clock root and period; the tree is rebuilt on the
    /// next `update_timing`.
    pub fn declare(&mut self, pin: PinId, period: f64) {
        self.root_pin = Some(pin);
        self.period = period;
        self.dirty = true;
    }

    /// Marks the tree for rebuild after a topology change near it.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Returns `true` when the tree needs a rebuild.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns `true` if the node is reachable from the clock root.
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains_key(&node)
    }

    /// Returns `true` if the node is reachable with an odd number of
    /// inversions.
    pub fn inverted(&self, node: NodeId) -> bool {
        self.members
            .get(&node)
            .is_some_and(|&mask| mask & ODD != 0)
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Longest root-to-leaf distance in edges.
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Rebuilds membership and parity from the graph.
    ///
    /// The BFS expands non-constraint fanout edges and stops at clock
    /// sinks (`is_sink`, the flip-flop clock pins): the sinks themselves
    /// belong to the tree, the sequential fanout behind them does not.
    pub fn rebuild(
        &mut self,
        pins_root_node: Option<NodeId>,
        nodes: &Arena<NodeId, Node>,
        edges: &Arena<EdgeId, Edge>,
        is_sink: impl Fn(NodeId) -> bool,
    ) {
        self.members.clear();
        self.depth = 0;
        self.dirty = false;

        let Some(root) = pins_root_node else {
            return;
        };
        if !nodes.contains(root) {
            return;
        }

        let mut queue: VecDeque<(NodeId, u8, i32)> = VecDeque::new();
        self.members.insert(root, EVEN);
        queue.push_back((root, EVEN, 0));

        while let Some((u, mask, dist)) = queue.pop_front() {
            self.depth = self.depth.max(dist);
            if is_sink(u) && u != root {
                continue;
            }
            for &eid in &nodes[u].fanout {
                let edge = &edges[eid];
                if edge.kind.is_constraint() {
                    continue;
                }
                let next_mask = match edge.sense {
                    TimingSense::NegativeUnate => swap_parity(mask),
                    _ => mask,
                };
                let entry = self.members.entry(edge.to).or_insert(0);
                if *entry & next_mask == next_mask {
                    continue;
                }
                *entry |= next_mask;
                queue.push_back((edge.to, next_mask, dist + 1));
            }
        }
    }
}

fn swap_parity(mask: u8) -> u8 {
    let mut out = 0;
    if mask & EVEN != 0 {
        out |= ODD;
    }
    if mask & ODD != 0 {
        out |= EVEN;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeDelay, EdgeKind};
    use crate::ids::NetId;
    use tempus_common::ArenaId;

    fn add_node(nodes: &mut Arena<NodeId, Node>) -> NodeId {
        nodes.insert(Node::new(PinId::from_raw(0)))
    }

    fn add_edge(
        nodes: &mut Arena<NodeId, Node>,
        edges: &mut Arena<EdgeId, Edge>,
        from: NodeId,
        to: NodeId,
        sense: TimingSense,
    ) -> EdgeId {
        let id = edges.insert(Edge {
            from,
            to,
            kind: EdgeKind::Net(NetId::from_raw(0)),
            sense,
            delay: EdgeDelay::zero_preserving(),
        });
        nodes[from].fanout.push(id);
        nodes[to].fanin.push(id);
        id
    }

    #[test]
    fn bfs_reaches_fanout_cone() {
        let mut nodes = Arena::new();
        let mut edges = Arena::new();
        let root = add_node(&mut nodes);
        let a = add_node(&mut nodes);
        let b = add_node(&mut nodes);
        let other = add_node(&mut nodes);
        add_edge(&mut nodes, &mut edges, root, a, TimingSense::PositiveUnate);
        add_edge(&mut nodes, &mut edges, a, b, TimingSense::PositiveUnate);

        let mut tree = ClockTree::new();
        tree.declare(PinId::from_raw(0), 40.0);
        tree.rebuild(Some(root), &nodes, &edges, |_| false);
        assert!(tree.contains(root));
        assert!(tree.contains(a));
        assert!(tree.contains(b));
        assert!(!tree.contains(other));
        assert_eq!(tree.size(), 3);
        assert_eq!(tree.depth(), 2);
        assert!(!tree.is_dirty());
    }

    #[test]
    fn inverter_flips_parity() {
        let mut nodes = Arena::new();
        let mut edges = Arena::new();
        let root = add_node(&mut nodes);
        let a = add_node(&mut nodes);
        add_edge(&mut nodes, &mut edges, root, a, TimingSense::NegativeUnate);

        let mut tree = ClockTree::new();
        tree.declare(PinId::from_raw(0), 10.0);
        tree.rebuild(Some(root), &nodes, &edges, |_| false);
        assert!(!tree.inverted(root));
        assert!(tree.inverted(a));
    }

    #[test]
    fn no_clock_declared() {
        let nodes = Arena::new();
        let edges = Arena::new();
        let mut tree = ClockTree::new();
        tree.rebuild(None, &nodes, &edges, |_| false);
        assert_eq!(tree.size(), 0);
    }
}
