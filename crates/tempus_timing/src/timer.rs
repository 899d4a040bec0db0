//! The timing engine facade.
//!
//! [`Timer`] owns the design (pins, nets, gates, primary I/O), the timing
//! graph, the frontier pipeline, the clock tree, the tests with their
//! endpoint heap, and the two characterization libraries. Every mutator
//! records invalidated nodes into the pipeline; [`Timer::update_timing`]
//! drains it through the staged forward and backward propagation passes.
//! Timing queries trigger a lazy incremental update.

use crate::clock::ClockTree;
use crate::cppr;
use crate::error::{TimingError, TimingResult};
use crate::graph::{Edge, EdgeDelay, EdgeKind, Jump, Node};
use crate::heap::EndpointHeap;
use crate::ids::{EdgeId, GateId, JumpId, NetId, NodeId, PinId, TestId};
use crate::netlist::{
    Gate, Net, Pin, PinDirection, PrimaryInput, PrimaryOutput, TimingAssertions,
};
use crate::path::{self, Path};
use crate::pipeline::Pipeline;
use crate::rctree::{ParasiticsDesc, RcTree};
use crate::test::{Endpoint, EndpointReport, Test, TestKind};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use tempus_celllib::{CellLib, PinDirection as CellpinDirection, TimingArc, TimingSense};
use tempus_common::{split_trans, Arena, ArenaId, Ident, Interner, Split, SplitTrans, Trans, CLIP};
use tempus_diagnostics::{Category, DiagnosticCode, DiagnosticSink};

/// The incremental static timing engine.
pub struct Timer {
    name: String,
    interner: Interner,
    sink: DiagnosticSink,
    libs: [CellLib; 2],

    pub(crate) pins: Arena<PinId, Pin>,
    pin_names: HashMap<Ident, PinId>,
    pub(crate) nets: Arena<NetId, Net>,
    net_names: HashMap<Ident, NetId>,
    pub(crate) gates: Arena<GateId, Gate>,
    gate_names: HashMap<Ident, GateId>,
    pub(crate) pis: HashMap<Ident, PrimaryInput>,
    pub(crate) pos: HashMap<Ident, PrimaryOutput>,

    pub(crate) nodes: Arena<NodeId, Node>,
    pub(crate) edges: Arena<EdgeId, Edge>,
    pub(crate) jumps: Arena<JumpId, Jump>,
    pub(crate) tests: Arena<TestId, Test>,

    pipeline: Pipeline,
    pub(crate) clock: ClockTree,
    heap: EndpointHeap,

    pub(crate) cutoff: SplitTrans<f64>,
    tns: SplitTrans<f64>,
    wns: SplitTrans<f64>,
    tns_valid: SplitTrans<bool>,
    wns_valid: SplitTrans<bool>,
}

impl Timer {
    /// Creates an engine over one early and one late library.
    ///
    /// The two libraries must be structurally identical: same cells, pin
    /// names, and arc topology, differing only in table values.
    pub fn new(early: CellLib, late: CellLib) -> Self {
        Self {
            name: String::new(),
            interner: Interner::new(),
            sink: DiagnosticSink::new(),
            libs: [early, late],
            pins: Arena::new(),
            pin_names: HashMap::new(),
            nets: Arena::new(),
            net_names: HashMap::new(),
            gates: Arena::new(),
            gate_names: HashMap::new(),
            pis: HashMap::new(),
            pos: HashMap::new(),
            nodes: Arena::new(),
            edges: Arena::new(),
            jumps: Arena::new(),
            tests: Arena::new(),
            pipeline: Pipeline::new(),
            clock: ClockTree::new(),
            heap: EndpointHeap::new(),
            cutoff: SplitTrans::splat(0.0),
            tns: SplitTrans::splat(0.0),
            wns: SplitTrans::splat(0.0),
            tns_valid: SplitTrans::splat(false),
            wns_valid: SplitTrans::splat(false),
        }
    }

    /// Sets the design name used in reports.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// The design name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The diagnostic sink warnings and recovered errors are emitted to.
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.sink
    }

    /// Sets the slack cutoff: endpoints above it are dropped from the
    /// endpoint heap and skipped by CPPR correction.
    pub fn set_cutoff_slack(&mut self, el: Split, rf: Trans, slack: f64) {
        self.cutoff[(el, rf)] = slack;
    }

    /// The current slack cutoff.
    pub fn cutoff_slack(&self, el: Split, rf: Trans) -> f64 {
        self.cutoff[(el, rf)]
    }

    // --- name resolution -------------------------------------------------

    pub(crate) fn pin_id(&self, name: &str) -> Option<PinId> {
        self.pin_names.get(&self.interner.get(name)?).copied()
    }

    fn net_id(&self, name: &str) -> Option<NetId> {
        self.net_names.get(&self.interner.get(name)?).copied()
    }

    fn gate_id(&self, name: &str) -> Option<GateId> {
        self.gate_names.get(&self.interner.get(name)?).copied()
    }

    pub(crate) fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    fn lib(&self, el: Split) -> &CellLib {
        &self.libs[el.index()]
    }

    /// Resolves a pin's cellpin in the given split's library.
    pub(crate) fn cellpin(&self, pin: &Pin, el: Split) -> Option<&tempus_celllib::Cellpin> {
        let gate = self.gates.get(pin.gate?)?;
        self.lib(el).cell(&gate.cell_name)?.cellpins.get(pin.cellpin?)
    }

    fn pin_cap(&self, pin: &Pin, el: Split) -> f64 {
        self.cellpin(pin, el).map_or(0.0, |cp| cp.capacitance)
    }

    /// Sink-side capacitance a pin contributes to its net.
    fn leaf_cap(&self, pid: PinId, el: Split, rf: Trans) -> f64 {
        let pin = &self.pins[pid];
        let mut cap = self.pin_cap(pin, el);
        if pin.direction == PinDirection::PrimaryOutput {
            if let Some(po) = self.pos.get(&pin.name) {
                cap += po.load[(el, rf)];
            }
        }
        cap
    }

    /// Load capacitance seen by a pin, through its net.
    pub(crate) fn pin_load(&self, pid: PinId, el: Split, rf: Trans) -> f64 {
        match self.pins[pid].net {
            Some(nid) => self.nets[nid].load(el, rf),
            None => 0.0,
        }
    }

    /// Resolves the timing arc behind a combinational edge.
    pub(crate) fn comb_arc(&self, eid: EdgeId, el: Split) -> Option<&TimingArc> {
        let edge = self.edges.get(eid)?;
        let EdgeKind::Comb { arc } = edge.kind else {
            return None;
        };
        let pin = &self.pins[self.nodes[edge.to].pin];
        self.cellpin(pin, el)?.arcs.get(arc)
    }

    /// Resolves the constraint arc behind a sequential test.
    pub(crate) fn test_arc(&self, tid: TestId, el: Split) -> Option<&TimingArc> {
        let TestKind::Sequential {
            constrained, arc, ..
        } = self.tests.get(tid)?.kind
        else {
            return None;
        };
        self.cellpin(&self.pins[constrained], el)?.arcs.get(arc)
    }

    fn warn(&self, category: Category, number: u16, message: String) {
        self.sink.warning(DiagnosticCode::new(category, number), message);
    }

    // --- pin / node plumbing ---------------------------------------------

    fn insert_pin(&mut self, name: Ident, direction: PinDirection) -> TimingResult<PinId> {
        if self.pin_names.contains_key(&name) {
            return Err(TimingError::DuplicateName(self.resolve(name).to_string()));
        }
        // The pin briefly points at a placeholder node until its real
        // node exists.
        let placeholder = NodeId::from_raw(u32::MAX);
        let pid = self.pins.insert(Pin::new(name, direction, placeholder));
        let node = self.nodes.insert(Node::new(pid));
        self.pins[pid].node = node;
        self.pin_names.insert(name, pid);
        Ok(pid)
    }

    fn remove_pin(&mut self, pid: PinId) {
        let node = self.pins[pid].node;
        self.remove_node_jumps(node);
        self.pipeline.remove(&mut self.nodes, node);
        self.nodes.remove(node);
        let name = self.pins[pid].name;
        self.pin_names.remove(&name);
        self.pins.remove(pid);
    }

    fn insert_frontier(&mut self, node: NodeId) {
        self.pipeline.insert(&mut self.nodes, node);
    }

    // --- edges and jumps -------------------------------------------------

    fn insert_edge_raw(
        &mut self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        sense: TimingSense,
        delay: EdgeDelay,
    ) -> EdgeId {
        let eid = self.edges.insert(Edge {
            from,
            to,
            kind,
            sense,
            delay,
        });
        self.nodes[from].fanout.push(eid);
        self.nodes[to].fanin.push(eid);
        self.remove_node_jumps(from);
        self.remove_node_jumps(to);

        // Pipeline the source; the sink re-enters through fanout
        // expansion with its level settled.
        self.pipeline.remove(&mut self.nodes, to);
        let level = (self.nodes[from].level + 1).max(self.nodes[to].level);
        self.nodes[to].level = level;
        self.insert_frontier(from);
        eid
    }

    fn remove_edge(&mut self, eid: EdgeId) {
        let Some(edge) = self.edges.get(eid) else {
            return;
        };
        let (from, to) = (edge.from, edge.to);
        self.remove_node_jumps(from);
        self.remove_node_jumps(to);
        self.nodes[from].fanout.retain(|&e| e != eid);
        self.nodes[to].fanin.retain(|&e| e != eid);
        self.insert_frontier(from);
        self.insert_frontier(to);
        self.edges.remove(eid);
    }

    fn find_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        let scan_fanout = self.nodes[from].fanout.len() <= self.nodes[to].fanin.len();
        let list = if scan_fanout {
            &self.nodes[from].fanout
        } else {
            &self.nodes[to].fanin
        };
        list.iter()
            .copied()
            .find(|&e| self.edges[e].from == from && self.edges[e].to == to)
    }

    fn remove_node_jumps(&mut self, node: NodeId) {
        let mut incident = self.nodes[node].jumpin.clone();
        incident.extend_from_slice(&self.nodes[node].jumpout);
        for jid in incident {
            self.remove_jump(jid);
        }
    }

    fn remove_jump(&mut self, jid: JumpId) {
        let Some(jump) = self.jumps.get(jid) else {
            return;
        };
        let (from, to) = (jump.from, jump.to);
        self.nodes[from].jumpout.retain(|&j| j != jid);
        self.nodes[to].jumpin.retain(|&j| j != jid);
        self.jumps.remove(jid);
    }

    fn insert_jump(&mut self, from: NodeId, to: NodeId, negs: u32, delay: SplitTrans<f64>) {
        let jid = self.jumps.insert(Jump {
            from,
            to,
            negs,
            delay,
        });
        self.nodes[from].jumpout.push(jid);
        self.nodes[to].jumpin.push(jid);
    }

    // --- primary I/O -----------------------------------------------------

    /// Creates a primary input port with a pin, a node, and a same-named
    /// net driven by it.
    pub fn insert_primary_input(&mut self, name: &str) -> TimingResult<()> {
        let ident = self.interner.get_or_intern(name);
        if self.pis.contains_key(&ident) || self.net_names.contains_key(&ident) {
            return Err(TimingError::DuplicateName(name.to_string()));
        }
        let pid = self.insert_pin(ident, PinDirection::PrimaryInput)?;
        self.pis.insert(ident, PrimaryInput::new(ident, pid));
        let node = self.pins[pid].node;
        self.insert_frontier(node);
        self.insert_net(name)?;
        self.connect_pin(name, name)?;
        Ok(())
    }

    /// Creates a primary output port with a pin, a node, a same-named
    /// net, and a required-time test.
    pub fn insert_primary_output(&mut self, name: &str) -> TimingResult<()> {
        let ident = self.interner.get_or_intern(name);
        if self.pos.contains_key(&ident) || self.net_names.contains_key(&ident) {
            return Err(TimingError::DuplicateName(name.to_string()));
        }
        let pid = self.insert_pin(ident, PinDirection::PrimaryOutput)?;
        self.pos.insert(ident, PrimaryOutput::new(ident, pid));
        let tid = self.tests.insert(Test::new(TestKind::PrimaryOutput { pin: pid }));
        self.pins[pid].test = Some(tid);
        self.insert_net(name)?;
        self.connect_pin(name, name)?;
        Ok(())
    }

    /// Declares the clock: `port` becomes the clock root with the given
    /// period. The clock tree is derived on the next update.
    pub fn declare_clock(&mut self, port: &str, period: f64) -> TimingResult<()> {
        let ident = self
            .interner
            .get(port)
            .filter(|i| self.pis.contains_key(i))
            .ok_or_else(|| TimingError::MissingPin(port.to_string()))?;
        let pid = self.pis[&ident].pin;
        self.clock.declare(pid, period);
        self.insert_frontier(self.pins[pid].node);
        Ok(())
    }

    // --- gates -----------------------------------------------------------

    /// Creates an unconnected gate instance of the named cell.
    ///
    /// Unknown cells produce a placeholder blockage (and a warning), not
    /// an error.
    pub fn insert_gate(&mut self, gate_name: &str, cell_name: &str) -> TimingResult<()> {
        let gname = self.interner.get_or_intern(gate_name);
        if self.gate_names.contains_key(&gname) {
            return Err(TimingError::DuplicateName(gate_name.to_string()));
        }

        if self.libs[0].cell(cell_name).is_none() || self.libs[1].cell(cell_name).is_none() {
            self.warn(
                Category::Library,
                1,
                format!("cell \"{cell_name}\" not found; treating \"{gate_name}\" as a blockage"),
            );
            self.libs[0].insert_placeholder(cell_name);
            self.libs[1].insert_placeholder(cell_name);
        }

        // Snapshot the structure from the early library; the late cell is
        // structurally identical.
        struct ArcSpec {
            related: String,
            constraint: bool,
            sense: TimingSense,
        }
        struct PinSpec {
            name: String,
            direction: PinDirection,
            arcs: Vec<ArcSpec>,
        }
        let specs: Vec<PinSpec> = self.libs[0]
            .cell(cell_name)
            .expect("cell exists after placeholder insertion")
            .cellpins
            .iter()
            .map(|cp| PinSpec {
                name: cp.name.clone(),
                direction: match cp.direction {
                    CellpinDirection::Input => PinDirection::Input,
                    CellpinDirection::Output => PinDirection::Output,
                },
                arcs: cp
                    .arcs
                    .iter()
                    .map(|a| ArcSpec {
                        related: a.related_pin.clone(),
                        constraint: a.is_constraint(),
                        sense: a.sense,
                    })
                    .collect(),
            })
            .collect();

        // All-or-nothing name check before any state change.
        let pin_idents: Vec<Ident> = specs
            .iter()
            .map(|s| self.interner.qualify(gate_name, &s.name))
            .collect();
        for (i, (spec, ident)) in specs.iter().zip(&pin_idents).enumerate() {
            if self.pin_names.contains_key(ident) || pin_idents[..i].contains(ident) {
                return Err(TimingError::DuplicateName(format!(
                    "{gate_name}:{}",
                    spec.name
                )));
            }
        }

        let gid = self.gates.insert(Gate {
            name: gname,
            cell_name: cell_name.to_string(),
            pins: Vec::new(),
        });
        self.gate_names.insert(gname, gid);

        let mut pin_ids = Vec::with_capacity(specs.len());
        for (idx, (spec, &ident)) in specs.iter().zip(&pin_idents).enumerate() {
            let pid = self
                .insert_pin(ident, spec.direction)
                .expect("collision checked above");
            self.pins[pid].gate = Some(gid);
            self.pins[pid].cellpin = Some(idx);
            pin_ids.push(pid);
        }
        self.gates[gid].pins = pin_ids.clone();

        // One edge per timing arc; one test per constraint arc.
        for (to_idx, spec) in specs.iter().enumerate() {
            for (arc_idx, arc) in spec.arcs.iter().enumerate() {
                let Some(from_idx) = specs.iter().position(|s| s.name == arc.related) else {
                    self.warn(
                        Category::Library,
                        2,
                        format!(
                            "cell \"{cell_name}\" arc refers to unknown pin \"{}\"",
                            arc.related
                        ),
                    );
                    continue;
                };
                if from_idx == to_idx {
                    self.warn(
                        Category::Library,
                        3,
                        format!("cell \"{cell_name}\" has a self-referential arc (skipped)"),
                    );
                    continue;
                }
                let from_node = self.pins[pin_ids[from_idx]].node;
                let to_node = self.pins[pin_ids[to_idx]].node;
                if arc.constraint {
                    let tid = self.tests.insert(Test::new(TestKind::Sequential {
                        related: pin_ids[from_idx],
                        constrained: pin_ids[to_idx],
                        arc: arc_idx,
                    }));
                    self.pins[pin_ids[to_idx]].test = Some(tid);
                    self.insert_edge_raw(
                        from_node,
                        to_node,
                        EdgeKind::Constraint { test: tid },
                        arc.sense,
                        EdgeDelay::undefined(),
                    );
                } else {
                    self.insert_edge_raw(
                        from_node,
                        to_node,
                        EdgeKind::Comb { arc: arc_idx },
                        arc.sense,
                        EdgeDelay::undefined(),
                    );
                }
            }
        }
        Ok(())
    }

    /// Rebinds a gate to a different (structurally identical) cell,
    /// typically a different drive strength of the same function.
    ///
    /// Cell edges and tests cache a position into the driven cellpin's
    /// arc list, and a variant is free to list the same arcs in another
    /// order; each cached position is re-bound to the new cell's arc
    /// with the same related pin and check kind. A variant with no
    /// counterpart for a bound arc is rejected.
    pub fn repower_gate(&mut self, gate_name: &str, cell_name: &str) -> TimingResult<()> {
        let gid = self
            .gate_id(gate_name)
            .ok_or_else(|| TimingError::MissingGate(gate_name.to_string()))?;
        if self.libs[0].cell(cell_name).is_none() || self.libs[1].cell(cell_name).is_none() {
            return Err(TimingError::MissingCell(cell_name.to_string()));
        }
        let old_cell = self.gates[gid].cell_name.clone();
        if old_cell == cell_name {
            return Ok(());
        }
        {
            let old = self.libs[0].cell(&old_cell);
            let new = self.libs[0].cell(cell_name).unwrap();
            let compatible = old.is_some_and(|old| {
                old.cellpins.len() == new.cellpins.len()
                    && old
                        .cellpins
                        .iter()
                        .zip(&new.cellpins)
                        .all(|(a, b)| a.name == b.name)
            });
            if !compatible {
                return Err(TimingError::InvalidMutation(format!(
                    "cell \"{cell_name}\" does not match the pin topology of \"{old_cell}\""
                )));
            }
        }

        let pin_ids = self.gates[gid].pins.clone();

        // Re-bind every cached arc position before touching any state, so
        // an unmappable variant aborts with nothing half-applied.
        let mut edge_rebinds: Vec<(EdgeId, usize)> = Vec::new();
        let mut test_rebinds: Vec<(TestId, usize)> = Vec::new();
        {
            let old = self.libs[0].cell(&old_cell);
            let new = self
                .libs[0]
                .cell(cell_name)
                .expect("presence checked above");
            for (idx, &pid) in pin_ids.iter().enumerate() {
                let old_arcs = old
                    .and_then(|c| c.cellpins.get(idx))
                    .map_or(&[][..], |cp| cp.arcs.as_slice());
                let new_arcs = new.cellpins.get(idx).map_or(&[][..], |cp| cp.arcs.as_slice());
                let node = self.pins[pid].node;
                for &eid in &self.nodes[node].fanin {
                    let arc = match self.edges[eid].kind {
                        EdgeKind::Comb { arc } => arc,
                        EdgeKind::Constraint { test } => {
                            let TestKind::Sequential { arc, .. } = self.tests[test].kind else {
                                continue;
                            };
                            arc
                        }
                        EdgeKind::Net(_) => continue,
                    };
                    let Some(target) = matching_arc(old_arcs, new_arcs, arc) else {
                        let pin = new.cellpins.get(idx).map_or("?", |cp| cp.name.as_str());
                        let related = old_arcs
                            .get(arc)
                            .map_or("?", |a| a.related_pin.as_str());
                        return Err(TimingError::InvalidMutation(format!(
                            "cell \"{cell_name}\" carries no arc onto \"{pin}\" from \
                             \"{related}\" matching \"{old_cell}\""
                        )));
                    };
                    match self.edges[eid].kind {
                        EdgeKind::Comb { .. } => edge_rebinds.push((eid, target)),
                        EdgeKind::Constraint { test } => test_rebinds.push((test, target)),
                        EdgeKind::Net(_) => {}
                    }
                }
            }
        }

        for (idx, &pid) in pin_ids.iter().enumerate() {
            for el in Split::ALL {
                let old_cap = self
                    .lib(el)
                    .cell(&old_cell)
                    .and_then(|c| c.cellpins.get(idx))
                    .map_or(0.0, |cp| cp.capacitance);
                let new_cap = self
                    .lib(el)
                    .cell(cell_name)
                    .and_then(|c| c.cellpins.get(idx))
                    .map_or(0.0, |cp| cp.capacitance);
                let delta = new_cap - old_cap;
                if delta == 0.0 || self.pins[pid].is_net_root() {
                    continue;
                }
                let rc_node = self.pins[pid].rc_node;
                if let Some(nid) = self.pins[pid].net {
                    for rf in Trans::ALL {
                        self.nets[nid].total_leaf_cap[(el, rf)] += delta;
                    }
                    if let (Some(rc), Some(tree)) = (rc_node, self.nets[nid].rctree.as_mut()) {
                        for rf in Trans::ALL {
                            tree.add_cap(rc, el, rf, delta);
                        }
                    }
                }
            }
            let node = self.pins[pid].node;
            for eid in self.nodes[node].fanin.clone() {
                let from = self.edges[eid].from;
                self.insert_frontier(from);
            }
        }

        for (eid, arc) in edge_rebinds {
            self.edges[eid].kind = EdgeKind::Comb { arc };
        }
        for (tid, arc) in test_rebinds {
            if let TestKind::Sequential {
                related,
                constrained,
                ..
            } = self.tests[tid].kind
            {
                self.tests[tid].kind = TestKind::Sequential {
                    related,
                    constrained,
                    arc,
                };
            }
        }
        self.gates[gid].cell_name = cell_name.to_string();
        Ok(())
    }

    /// Removes a fully disconnected gate together with its pins, nodes,
    /// internal edges, and tests.
    pub fn remove_gate(&mut self, gate_name: &str) -> TimingResult<()> {
        let gid = self
            .gate_id(gate_name)
            .ok_or_else(|| TimingError::MissingGate(gate_name.to_string()))?;
        let pin_ids = self.gates[gid].pins.clone();
        if pin_ids.iter().any(|&p| self.pins[p].net.is_some()) {
            return Err(TimingError::InvalidMutation(format!(
                "gate \"{gate_name}\" is still connected"
            )));
        }
        for &pid in &pin_ids {
            let node = self.pins[pid].node;
            for eid in self.nodes[node].fanin.clone() {
                self.remove_edge(eid);
            }
            for eid in self.nodes[node].fanout.clone() {
                self.remove_edge(eid);
            }
            if let Some(tid) = self.pins[pid].test.take() {
                for (el, rf) in split_trans() {
                    self.heap.remove(&mut self.tests, Endpoint { test: tid, el, rf });
                }
                self.tests.remove(tid);
            }
        }
        for pid in pin_ids {
            self.remove_pin(pid);
        }
        let name = self.gates[gid].name;
        self.gate_names.remove(&name);
        self.gates.remove(gid);
        Ok(())
    }

    /// Replaces a primary input with a driving gate, transferring the
    /// PI's net and RC binding to the driver's output pin. The PI itself
    /// is left isolated.
    pub fn splice_driver(
        &mut self,
        pi_name: &str,
        gate_name: &str,
        cell_name: &str,
    ) -> TimingResult<()> {
        let pi_ident = self
            .interner
            .get(pi_name)
            .filter(|i| self.pis.contains_key(i))
            .ok_or_else(|| TimingError::MissingPin(pi_name.to_string()))?;
        self.insert_gate(gate_name, cell_name)?;

        let gid = self.gate_id(gate_name).expect("gate inserted above");
        let driver_pid = self.gates[gid]
            .pins
            .iter()
            .copied()
            .find(|&p| self.pins[p].direction == PinDirection::Output)
            .ok_or_else(|| {
                TimingError::InvalidMutation(format!("cell \"{cell_name}\" has no output pin"))
            })?;

        let pi_pid = self.pis[&pi_ident].pin;
        let Some(nid) = self.pins[pi_pid].net else {
            return Ok(());
        };
        let rc_node = self.pins[pi_pid].rc_node;

        self.disconnect_pin(pi_name)?;
        let driver_name = self.resolve(self.pins[driver_pid].name).to_string();
        let net_name = self.resolve(self.nets[nid].name).to_string();
        self.connect_pin(&driver_name, &net_name)?;

        if let Some(rc) = rc_node {
            self.pins[driver_pid].rc_node = Some(rc);
            let driver_ident = self.pins[driver_pid].name;
            if let Some(tree) = self.nets[nid].rctree.as_mut() {
                if let Some(node) = tree.node_mut(rc) {
                    node.pin = Some(driver_pid);
                }
                tree.rehash_node(pi_ident, driver_ident);
            }
        }
        Ok(())
    }

    // --- nets and pins ---------------------------------------------------

    /// Creates an empty net.
    pub fn insert_net(&mut self, name: &str) -> TimingResult<()> {
        let ident = self.interner.get_or_intern(name);
        if self.net_names.contains_key(&ident) {
            return Err(TimingError::DuplicateName(name.to_string()));
        }
        let nid = self.nets.insert(Net::new(ident));
        self.net_names.insert(ident, nid);
        Ok(())
    }

    /// Removes a net; every pin must be disconnected from it first.
    pub fn remove_net(&mut self, name: &str) -> TimingResult<()> {
        let nid = self
            .net_id(name)
            .ok_or_else(|| TimingError::MissingNet(name.to_string()))?;
        if !self.nets[nid].pins.is_empty() {
            return Err(TimingError::InvalidMutation(format!(
                "net \"{name}\" still has connected pins"
            )));
        }
        let ident = self.nets[nid].name;
        self.net_names.remove(&ident);
        self.nets.remove(nid);
        Ok(())
    }

    /// Connects a pin to a net, constructing the induced net arcs.
    pub fn connect_pin(&mut self, pin_name: &str, net_name: &str) -> TimingResult<()> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        let nid = self
            .net_id(net_name)
            .ok_or_else(|| TimingError::MissingNet(net_name.to_string()))?;
        if self.pins[pid].net.is_some() {
            return Err(TimingError::InvalidMutation(format!(
                "pin \"{pin_name}\" is already connected"
            )));
        }
        let is_root = self.pins[pid].is_net_root();
        if is_root && self.nets[nid].root.is_some() {
            return Err(TimingError::InvalidMutation(format!(
                "net \"{net_name}\" already has a driver"
            )));
        }

        self.nets[nid].pins.push(pid);
        self.pins[pid].net = Some(nid);

        if is_root {
            self.nets[nid].root = Some(pid);
            for leaf in self.nets[nid].pins.clone() {
                if leaf != pid {
                    self.insert_net_edge(pid, leaf, nid);
                }
            }
        } else {
            for (el, rf) in split_trans() {
                let cap = self.leaf_cap(pid, el, rf);
                self.nets[nid].total_leaf_cap[(el, rf)] += cap;
            }
            if let Some(root) = self.nets[nid].root {
                self.insert_net_edge(root, pid, nid);
            }
        }

        if self.clock.contains(self.pins[pid].node) {
            self.clock.invalidate();
        }
        Ok(())
    }

    /// Disconnects a pin from its net, removing the induced net arcs.
    /// A pin with no net is left untouched.
    pub fn disconnect_pin(&mut self, pin_name: &str) -> TimingResult<()> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        let Some(nid) = self.pins[pid].net else {
            return Ok(());
        };
        let node = self.pins[pid].node;
        let root = self.nets[nid].root;

        if root == Some(pid) {
            for leaf in self.nets[nid].pins.clone() {
                if leaf != pid {
                    if let Some(eid) = self.find_edge(node, self.pins[leaf].node) {
                        self.remove_edge(eid);
                    }
                }
            }
            self.nets[nid].root = None;
        } else {
            if let Some(r) = root {
                if let Some(eid) = self.find_edge(self.pins[r].node, node) {
                    self.remove_edge(eid);
                }
            }
            for (el, rf) in split_trans() {
                let cap = self.leaf_cap(pid, el, rf);
                self.nets[nid].total_leaf_cap[(el, rf)] -= cap;
            }
        }

        if self.clock.contains(node) {
            self.clock.invalidate();
        }

        self.nets[nid].pins.retain(|&p| p != pid);
        self.pins[pid].net = None;

        if let Some(rc) = self.pins[pid].rc_node.take() {
            let was_leaf = root != Some(pid);
            let caps: Vec<(Split, Trans, f64)> = if was_leaf {
                split_trans()
                    .map(|(el, rf)| (el, rf, self.leaf_cap(pid, el, rf)))
                    .collect()
            } else {
                Vec::new()
            };
            if let Some(tree) = self.nets[nid].rctree.as_mut() {
                for (el, rf, cap) in caps {
                    tree.add_cap(rc, el, rf, -cap);
                }
                if let Some(rc_node) = tree.node_mut(rc) {
                    rc_node.pin = None;
                }
            }
        }
        Ok(())
    }

    fn insert_net_edge(&mut self, from_pid: PinId, to_pid: PinId, nid: NetId) {
        let from = self.pins[from_pid].node;
        let to = self.pins[to_pid].node;
        self.insert_edge_raw(
            from,
            to,
            EdgeKind::Net(nid),
            TimingSense::PositiveUnate,
            EdgeDelay::zero_preserving(),
        );
    }

    /// Loads (or replaces) a net's parasitics from a parsed description,
    /// binding RC nodes to same-named pins and solving the tree once.
    pub fn load_parasitics(&mut self, net_name: &str, desc: &ParasiticsDesc) -> TimingResult<()> {
        let nid = self
            .net_id(net_name)
            .ok_or_else(|| TimingError::MissingNet(net_name.to_string()))?;

        let mut tree = RcTree::new();
        for (name, cap) in &desc.caps {
            let ident = self.interner.get_or_intern(name);
            tree.insert_node(ident, *cap);
        }
        for (a, b, res) in &desc.segments {
            let a = self.interner.get_or_intern(a);
            let b = self.interner.get_or_intern(b);
            tree.insert_segment(a, b, *res);
        }

        let pin_ids = self.nets[nid].pins.clone();
        let mut bindings = Vec::with_capacity(pin_ids.len());
        for pid in pin_ids {
            let pname = self.pins[pid].name;
            let rc = tree
                .node_by_name(pname)
                .unwrap_or_else(|| tree.insert_node(pname, 0.0));
            if self.pins[pid].is_net_root() {
                tree.root = Some(rc);
            } else {
                // Tap pins lump their pin capacitance onto the RC node;
                // the root pin's capacitance is ignored.
                for (el, rf) in split_trans() {
                    let cap = self.leaf_cap(pid, el, rf);
                    tree.add_cap(rc, el, rf, cap);
                }
            }
            if let Some(node) = tree.node_mut(rc) {
                node.pin = Some(pid);
            }
            bindings.push((pid, rc));
        }

        tree.update_rc_timing()?;

        for (pid, rc) in bindings {
            self.pins[pid].rc_node = Some(rc);
        }
        let root_pin = self.nets[nid].root;
        self.nets[nid].rctree = Some(tree);
        if let Some(root) = root_pin {
            let node = self.pins[root].node;
            self.insert_frontier(node);
        }
        Ok(())
    }

    // --- boundary assertions ---------------------------------------------

    /// Asserts an arrival time on a primary input.
    ///
    /// Asserting on any other pin warns and writes the node directly.
    pub fn set_at(&mut self, pin_name: &str, el: Split, rf: Trans, value: f64) -> TimingResult<()> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        let pname = self.pins[pid].name;
        let node = self.pins[pid].node;
        match self.pis.get_mut(&pname) {
            Some(pi) => pi.at[(el, rf)] = value,
            None => {
                self.warn(
                    Category::Timing,
                    1,
                    format!("arrival time asserted on non-input pin \"{pin_name}\""),
                );
                self.nodes[node].at[(el, rf)] = value;
            }
        }
        self.insert_frontier(node);
        Ok(())
    }

    /// Asserts a transition time on a primary input.
    pub fn set_slew(
        &mut self,
        pin_name: &str,
        el: Split,
        rf: Trans,
        value: f64,
    ) -> TimingResult<()> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        let pname = self.pins[pid].name;
        let node = self.pins[pid].node;
        match self.pis.get_mut(&pname) {
            Some(pi) => pi.slew[(el, rf)] = value,
            None => {
                self.warn(
                    Category::Timing,
                    2,
                    format!("slew asserted on non-input pin \"{pin_name}\""),
                );
                self.nodes[node].slew[(el, rf)] = value;
            }
        }
        self.insert_frontier(node);
        Ok(())
    }

    /// Asserts a required arrival time on a primary output.
    pub fn set_rat(&mut self, pin_name: &str, el: Split, rf: Trans, value: f64) -> TimingResult<()> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        let pname = self.pins[pid].name;
        let node = self.pins[pid].node;
        match self.pos.get_mut(&pname) {
            Some(po) => po.rat[(el, rf)] = value,
            None => {
                self.warn(
                    Category::Timing,
                    3,
                    format!("required time asserted on non-output pin \"{pin_name}\""),
                );
                self.nodes[node].rat[(el, rf)] = value;
            }
        }
        self.insert_frontier(node);
        Ok(())
    }

    /// Asserts a load capacitance on a primary output.
    pub fn set_load(
        &mut self,
        pin_name: &str,
        el: Split,
        rf: Trans,
        value: f64,
    ) -> TimingResult<()> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        let pname = self.pins[pid].name;
        if !self.pos.contains_key(&pname) {
            self.warn(
                Category::Timing,
                4,
                format!("load asserted on non-output pin \"{pin_name}\" (ignored)"),
            );
            return Ok(());
        }
        let po = self.pos.get_mut(&pname).expect("checked above");
        let delta = value - po.load[(el, rf)];
        po.load[(el, rf)] = value;

        let rc_node = self.pins[pid].rc_node;
        if let Some(nid) = self.pins[pid].net {
            self.nets[nid].total_leaf_cap[(el, rf)] += delta;
            if let (Some(rc), Some(tree)) = (rc_node, self.nets[nid].rctree.as_mut()) {
                tree.add_cap(rc, el, rf, delta);
            }
        }
        let node = self.pins[pid].node;
        for eid in self.nodes[node].fanin.clone() {
            let from = self.edges[eid].from;
            self.insert_frontier(from);
        }
        Ok(())
    }

    /// Applies a structured initial I/O timing description through the
    /// boundary mutators. Assertions naming unknown ports warn and are
    /// skipped.
    pub fn apply_assertions(&mut self, assertions: &TimingAssertions) -> TimingResult<()> {
        for (port, period) in &assertions.clocks {
            if let Err(TimingError::MissingPin(_)) = self.declare_clock(port, *period) {
                self.warn(
                    Category::Timing,
                    5,
                    format!("clock declared on unknown primary input \"{port}\""),
                );
            }
        }
        for (port, at) in &assertions.ats {
            if self.pin_id(port).is_none() {
                self.warn(Category::Timing, 6, format!("arrival asserted on unknown port \"{port}\""));
                continue;
            }
            for (el, rf) in split_trans() {
                self.set_at(port, el, rf, at[(el, rf)])?;
            }
        }
        for (port, slew) in &assertions.slews {
            if self.pin_id(port).is_none() {
                self.warn(Category::Timing, 6, format!("slew asserted on unknown port \"{port}\""));
                continue;
            }
            for (el, rf) in split_trans() {
                self.set_slew(port, el, rf, slew[(el, rf)])?;
            }
        }
        for (port, rat) in &assertions.rats {
            if self.pin_id(port).is_none() {
                self.warn(Category::Timing, 6, format!("required time asserted on unknown port \"{port}\""));
                continue;
            }
            for (el, rf) in split_trans() {
                self.set_rat(port, el, rf, rat[(el, rf)])?;
            }
        }
        for (port, load) in &assertions.loads {
            if self.pin_id(port).is_none() {
                self.warn(Category::Timing, 6, format!("load asserted on unknown port \"{port}\""));
                continue;
            }
            for (el, rf) in split_trans() {
                self.set_load(port, el, rf, *load)?;
            }
        }
        Ok(())
    }

    // --- levelization ----------------------------------------------------

    fn update_node_level(&mut self, id: NodeId, level: i32) {
        if self.nodes[id].level == level {
            return;
        }
        if !self.nodes[id].in_pipeline() {
            self.nodes[id].level = level;
            return;
        }
        self.pipeline.remove(&mut self.nodes, id);
        self.nodes[id].level = level;
        self.pipeline.insert(&mut self.nodes, id);
    }

    /// Offline levelization: a topological scan assigning compact levels.
    fn relevelize_all(&mut self) {
        let mut indeg: HashMap<NodeId, usize> = HashMap::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        for (id, node) in self.nodes.iter() {
            indeg.insert(id, node.num_fanins());
            if node.num_fanins() == 0 {
                queue.push_back(id);
            }
        }
        for &id in queue.iter() {
            self.update_node_level(id, 0);
        }
        while let Some(u) = queue.pop_front() {
            let next = self.nodes[u].level + 1;
            for eid in self.nodes[u].fanout.clone() {
                let v = self.edges[eid].to;
                let d = indeg.get_mut(&v).expect("all nodes counted");
                *d -= 1;
                if *d == 0 {
                    // FIFO pops run in non-decreasing level order, so the
                    // last fanin to release a node is its deepest one.
                    self.update_node_level(v, next);
                    queue.push_back(v);
                }
            }
        }
    }

    fn init_full_timing_update(&mut self) {
        for id in self.nodes.ids().collect::<Vec<_>>() {
            self.pipeline.remove(&mut self.nodes, id);
            let node = &mut self.nodes[id];
            node.reset_at();
            node.reset_slew();
            node.reset_rat();
            if node.num_fanins() == 0 {
                node.level = 0;
                self.pipeline.insert(&mut self.nodes, id);
            }
        }
        self.relevelize_all();
    }

    // --- the update ------------------------------------------------------

    /// Drains the frontier pipeline and brings every affected timing
    /// quantity up to date.
    ///
    /// With `incremental == false`, all node timing is invalidated,
    /// sources are reseeded, and a full relevelization runs first.
    pub fn update_timing(&mut self, incremental: bool) {
        if !incremental {
            self.init_full_timing_update();
        }
        if self.pipeline.is_empty() {
            return;
        }

        if self.clock.is_dirty() {
            self.rebuild_clock_tree();
        }

        // Pipeline construction: expand and levelize the fanout cone of
        // every frontier node.
        let mut l = self.pipeline.min_level().expect("pipeline is nonempty");
        while let Some(max) = self.pipeline.max_level() {
            if l > max {
                break;
            }
            self.forward_propagate_fanout(l);
            l += 1;
        }

        // Staged forward propagation. Six stages run one level apart so
        // that, for any node, RC precedes slew precedes delay precedes
        // arrival, and jumps and tests see settled arrivals.
        let min = self.pipeline.min_level().expect("pipeline is nonempty");
        let max = self.pipeline.max_level().expect("pipeline is nonempty");
        for l in min..=max + 4 {
            self.forward_propagate_rc_timing(l);
            self.forward_propagate_slew(l - 1);
            self.forward_propagate_delay(l - 1);
            self.forward_propagate_at(l - 2);
            self.forward_propagate_jump(l - 3);
            self.forward_propagate_test(l - 4);
        }

        // Backward sweep: expand the fanin cone, then relax required
        // times from the endpoints down. The minimum watermark sinks as
        // fanin expansion enqueues upstream nodes.
        let mut l = self.pipeline.max_level().expect("pipeline is nonempty");
        while let Some(min) = self.pipeline.min_level() {
            if l < min {
                break;
            }
            self.backward_propagate_fanin(l);
            self.backward_propagate_rat(l);
            l -= 1;
        }

        self.tns_valid = SplitTrans::splat(false);
        self.wns_valid = SplitTrans::splat(false);
        self.pipeline.remove_all(&mut self.nodes);
        debug_assert_eq!(self.pipeline.num_nodes(), 0);
    }

    fn rebuild_clock_tree(&mut self) {
        let root_node = self.clock.root_pin.map(|p| self.pins[p].node);
        let sinks: HashSet<NodeId> = self
            .pins
            .iter()
            .filter(|(_, pin)| {
                Split::ALL
                    .into_iter()
                    .any(|el| self.cellpin(pin, el).is_some_and(|cp| cp.is_clock))
            })
            .map(|(_, pin)| pin.node)
            .collect();
        self.clock
            .rebuild(root_node, &self.nodes, &self.edges, |n| sinks.contains(&n));
    }

    fn forward_propagate_fanout(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            let next = self.nodes[id].level + 1;
            for eid in self.nodes[id].fanout.clone() {
                let to = self.edges[eid].to;
                if next > self.nodes[to].level {
                    self.pipeline.remove(&mut self.nodes, to);
                    self.nodes[to].level = next;
                }
                self.pipeline.insert(&mut self.nodes, to);
            }
        }
    }

    fn forward_propagate_rc_timing(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            let pid = self.nodes[id].pin;
            if !self.pins[pid].is_net_root() {
                continue;
            }
            let Some(nid) = self.pins[pid].net else {
                continue;
            };
            let net_name = self.nets[nid].name;
            if let Some(tree) = self.nets[nid].rctree.as_mut() {
                if let Err(err) = tree.update_rc_timing() {
                    let name = self.interner.resolve(net_name);
                    self.sink.error(
                        DiagnosticCode::new(Category::Parasitics, 1),
                        format!("rc update failed on net \"{name}\": {err}"),
                    );
                }
            }
        }
    }

    fn forward_propagate_slew(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            if self.nodes[id].fanin.is_empty() {
                let pname = self.pins[self.nodes[id].pin].name;
                if let Some(pi) = self.pis.get(&pname) {
                    let slew = pi.slew;
                    self.nodes[id].slew = slew;
                }
                continue;
            }

            let mut cands: Vec<(Split, Trans, f64)> = Vec::new();
            for &eid in &self.nodes[id].fanin {
                let edge = &self.edges[eid];
                let from = edge.from;
                match edge.kind {
                    EdgeKind::Net(nid) => {
                        let rc = self.pins[self.nodes[id].pin].rc_node;
                        let tree = self.nets[nid].rctree.as_ref();
                        for (el, rf) in split_trans() {
                            let si = self.nodes[from].slew[(el, rf)];
                            let so = match (tree, rc) {
                                (Some(tree), Some(rc)) => tree.slew(rc, el, rf, si),
                                _ => si,
                            };
                            cands.push((el, rf, so));
                        }
                    }
                    EdgeKind::Comb { .. } => {
                        for el in Split::ALL {
                            let Some(arc) = self.comb_arc(eid, el) else {
                                continue;
                            };
                            for irf in Trans::ALL {
                                for orf in Trans::ALL {
                                    let si = self.nodes[from].slew[(el, irf)];
                                    let load = self.pin_load(self.nodes[id].pin, el, orf);
                                    if let Some(so) = arc.slew(irf, orf, si, load) {
                                        cands.push((el, orf, so));
                                    }
                                }
                            }
                        }
                    }
                    EdgeKind::Constraint { .. } => {}
                }
            }

            let node = &mut self.nodes[id];
            node.reset_slew();
            for (el, rf, so) in cands {
                el.relax_forward(&mut node.slew[(el, rf)], so);
            }
        }
    }

    fn forward_propagate_delay(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            for eid in self.nodes[id].fanin.clone() {
                let mut delay = self.edges[eid].delay;
                let from = self.edges[eid].from;
                match self.edges[eid].kind {
                    EdgeKind::Net(nid) => {
                        let rc = self.pins[self.nodes[id].pin].rc_node;
                        let tree = self.nets[nid].rctree.as_ref();
                        for (el, rf) in split_trans() {
                            let d = match (tree, rc) {
                                (Some(tree), Some(rc)) => tree.delay(rc, el, rf),
                                _ => 0.0,
                            };
                            delay.set(el, rf, rf, Some(d));
                        }
                    }
                    EdgeKind::Comb { .. } => {
                        for el in Split::ALL {
                            let arc = self.comb_arc(eid, el);
                            for irf in Trans::ALL {
                                for orf in Trans::ALL {
                                    let d = arc.and_then(|arc| {
                                        let si = self.nodes[from].slew[(el, irf)];
                                        let load = self.pin_load(self.nodes[id].pin, el, orf);
                                        arc.delay(irf, orf, si, load)
                                    });
                                    delay.set(el, irf, orf, d);
                                }
                            }
                        }
                    }
                    EdgeKind::Constraint { .. } => {}
                }
                self.edges[eid].delay = delay;
            }
        }
    }

    fn forward_propagate_at(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            if self.nodes[id].fanin.is_empty() {
                let pname = self.pins[self.nodes[id].pin].name;
                if let Some(pi) = self.pis.get(&pname) {
                    let at = pi.at;
                    let is_clock_root =
                        self.clock.root_pin.map(|p| self.pins[p].node) == Some(id);
                    let node = &mut self.nodes[id];
                    node.at = at;
                    node.at_from = SplitTrans::splat(None);
                    node.at_clocked = SplitTrans::splat(is_clock_root);
                }
                continue;
            }

            type Cand = (Split, Trans, f64, EdgeId, Trans, bool);
            let mut cands: Vec<Cand> = Vec::new();
            for &eid in &self.nodes[id].fanin {
                let edge = &self.edges[eid];
                if edge.kind.is_constraint() {
                    continue;
                }
                let from = edge.from;
                for el in Split::ALL {
                    for irf in Trans::ALL {
                        for orf in Trans::ALL {
                            let Some(d) = edge.delay.get(el, irf, orf) else {
                                continue;
                            };
                            let at_u = self.nodes[from].at[(el, irf)];
                            let clocked = self.nodes[from].at_clocked[(el, irf)];
                            cands.push((el, orf, at_u + d, eid, irf, clocked));
                        }
                    }
                }
            }

            let node = &mut self.nodes[id];
            node.reset_at();
            for (el, orf, at, eid, irf, clocked) in cands {
                if el.relax_forward(&mut node.at[(el, orf)], at) {
                    node.at_from[(el, orf)] = Some((eid, irf));
                    node.at_clocked[(el, orf)] = clocked;
                }
            }
        }
    }

    // --- jumps -----------------------------------------------------------

    pub(crate) fn is_jump_tail(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.num_fanins() == 0 || node.num_fanouts() >= 2 || self.clock.contains(id)
    }

    pub(crate) fn is_jump_head(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        if node.num_fanins() == 0 || self.clock.contains(id) || self.is_jump_tail(id) {
            return false;
        }
        let constrained = self.pins[node.pin].test.is_some();
        node.num_fanins() >= 2 || node.num_fanouts() == 0 || constrained
    }

    fn forward_propagate_jump(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            self.remove_node_jumps(id);
            if self.is_jump_head(id) {
                self.induce_jump(id);
            }
        }
    }

    /// Walks the fanin chains of a jump head backward across unate,
    /// non-constraint edges, accumulating delay and parity, and inserts
    /// one jump per reached tail.
    fn induce_jump(&mut self, root: NodeId) {
        let mut stack: Vec<(NodeId, u32, SplitTrans<f64>)> =
            vec![(root, 0, SplitTrans::splat(0.0))];
        while let Some((v, negs, dv)) = stack.pop() {
            if self.is_jump_tail(v) {
                if v != root {
                    self.insert_jump(v, root, negs, dv);
                }
                continue;
            }
            for eid in self.nodes[v].fanin.clone() {
                let edge = &self.edges[eid];
                if edge.kind.is_constraint() {
                    continue;
                }
                let from = edge.from;
                let inverting = negs % 2 == 1;
                match edge.sense {
                    TimingSense::PositiveUnate => {
                        let du = SplitTrans::from_fn(|el, rf| {
                            let vrf = rf.xor(inverting);
                            dv[(el, rf)] + edge.delay.get(el, vrf, vrf).unwrap_or(0.0)
                        });
                        stack.push((from, negs, du));
                    }
                    TimingSense::NegativeUnate => {
                        let du = SplitTrans::from_fn(|el, rf| {
                            let vrf = rf.xor(inverting);
                            dv[(el, rf)] + edge.delay.get(el, vrf.flip(), vrf).unwrap_or(0.0)
                        });
                        stack.push((from, negs + 1, du));
                    }
                    // A non-unate arc cannot be condensed into a
                    // transition-tracking shortcut.
                    TimingSense::NonUnate => {}
                }
            }
        }
    }

    // --- tests -----------------------------------------------------------

    fn forward_propagate_test(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            if let Some(tid) = self.pins[self.nodes[id].pin].test {
                self.update_test(tid);
            }
        }
    }

    fn update_test(&mut self, tid: TestId) {
        let (rat, raw, slack, ck) = self.evaluate_test(tid);
        {
            let test = &mut self.tests[tid];
            test.rat = rat;
            test.raw_slack = raw;
            test.slack = slack;
            test.ck_rf = ck;
        }
        for (el, rf) in split_trans() {
            let ep = Endpoint { test: tid, el, rf };
            if self.tests[tid].slack[(el, rf)] > self.cutoff[(el, rf)] {
                self.heap.remove(&mut self.tests, ep);
            } else {
                self.heap.update(&mut self.tests, ep);
            }
        }
    }

    /// Computes a test's pre-CPPR required time and slack, and the
    /// CPPR-corrected slack where the check is critical and clock-fed.
    #[allow(clippy::type_complexity)]
    fn evaluate_test(
        &self,
        tid: TestId,
    ) -> (
        SplitTrans<f64>,
        SplitTrans<f64>,
        SplitTrans<f64>,
        SplitTrans<Option<Trans>>,
    ) {
        let mut rat = SplitTrans::from_fn(|el, _| el.undefined_rat());
        let mut raw = SplitTrans::splat(f64::INFINITY);
        let mut slack = SplitTrans::splat(f64::INFINITY);
        let mut ck = SplitTrans::splat(None);

        match self.tests[tid].kind {
            TestKind::Sequential {
                related,
                constrained,
                ..
            } => {
                let c_node = &self.nodes[self.pins[related].node];
                let d_node = &self.nodes[self.pins[constrained].node];
                let period = self.clock.period;
                for el in Split::ALL {
                    let Some(arc) = self.test_arc(tid, el) else {
                        continue;
                    };
                    for d_rf in Trans::ALL {
                        for ck_rf in Trans::ALL {
                            if !arc.is_transition_defined(ck_rf, d_rf) {
                                continue;
                            }
                            // Setup pairs the pessimistic data arrival
                            // with the optimistic capture clock; hold is
                            // the mirror image.
                            let cap_el = el.flip();
                            let at_c = c_node.at[(cap_el, ck_rf)];
                            let sl_c = c_node.slew[(cap_el, ck_rf)];
                            let at_d = d_node.at[(el, d_rf)];
                            let sl_d = d_node.slew[(el, d_rf)];
                            if !at_c.is_finite() || !at_d.is_finite() {
                                continue;
                            }
                            let Some(guard) = arc.constraint(ck_rf, d_rf, sl_c, sl_d) else {
                                continue;
                            };
                            if !guard.is_finite() {
                                continue;
                            }
                            let (r, s) = match el {
                                Split::Late => {
                                    let r = at_c + period - guard;
                                    (r, r - at_d)
                                }
                                Split::Early => {
                                    let r = at_c + guard;
                                    (r, at_d - r)
                                }
                            };
                            if s < raw[(el, d_rf)] {
                                raw[(el, d_rf)] = s;
                                rat[(el, d_rf)] = r;
                                ck[(el, d_rf)] = Some(ck_rf);
                            }
                        }
                        let mut s = raw[(el, d_rf)];
                        if s.is_finite()
                            && s <= self.cutoff[(el, d_rf)]
                            && d_node.at_clocked[(el, d_rf)]
                        {
                            if let Some(ck_rf) = ck[(el, d_rf)] {
                                s += cppr::credit(self, tid, el, d_rf, ck_rf);
                            }
                        }
                        slack[(el, d_rf)] = s;
                    }
                }
            }
            TestKind::PrimaryOutput { pin } => {
                let pname = self.pins[pin].name;
                let node = &self.nodes[self.pins[pin].node];
                if let Some(po) = self.pos.get(&pname) {
                    for (el, rf) in split_trans() {
                        let r = po.rat[(el, rf)];
                        let a = node.at[(el, rf)];
                        rat[(el, rf)] = r;
                        if r.is_finite() && a.is_finite() {
                            let s = match el {
                                Split::Late => r - a,
                                Split::Early => a - r,
                            };
                            raw[(el, rf)] = s;
                            slack[(el, rf)] = s;
                        }
                    }
                }
            }
        }
        (rat, raw, slack, ck)
    }

    // --- backward sweep --------------------------------------------------

    fn backward_propagate_fanin(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            for eid in self.nodes[id].fanin.clone() {
                let from = self.edges[eid].from;
                self.insert_frontier(from);
            }
        }
    }

    fn backward_propagate_rat(&mut self, level: i32) {
        for id in self.pipeline.nodes_at(level) {
            if self.nodes[id].fanout.is_empty() {
                let Some(tid) = self.pins[self.nodes[id].pin].test else {
                    continue;
                };
                let slacks = self.tests[tid].slack;
                let node = &mut self.nodes[id];
                node.reset_rat();
                for (el, rf) in split_trans() {
                    let at = node.at[(el, rf)];
                    let s = slacks[(el, rf)];
                    if at.is_finite() && s.is_finite() {
                        node.rat[(el, rf)] = match el {
                            Split::Early => at - s,
                            Split::Late => at + s,
                        };
                    }
                }
                continue;
            }

            let mut cands: Vec<(Split, Trans, f64)> = Vec::new();
            for &eid in &self.nodes[id].fanout {
                let edge = &self.edges[eid];
                let to = edge.to;
                match edge.kind {
                    EdgeKind::Net(_) | EdgeKind::Comb { .. } => {
                        for el in Split::ALL {
                            for irf in Trans::ALL {
                                for orf in Trans::ALL {
                                    let Some(d) = edge.delay.get(el, irf, orf) else {
                                        continue;
                                    };
                                    cands.push((el, irf, self.nodes[to].rat[(el, orf)] - d));
                                }
                            }
                        }
                    }
                    EdgeKind::Constraint { test } => {
                        // The clock pin inherits a required time from the
                        // data pin's slack on the opposite split.
                        for el in Split::ALL {
                            let Some(arc) = self.test_arc(test, el) else {
                                continue;
                            };
                            for ck_rf in Trans::ALL {
                                for d_rf in Trans::ALL {
                                    if !arc.is_transition_defined(ck_rf, d_rf) {
                                        continue;
                                    }
                                    let d_slack = self.nodes[to].slack(el, d_rf);
                                    if !d_slack.is_finite() {
                                        continue;
                                    }
                                    match el {
                                        Split::Early => {
                                            let at = self.nodes[id].at[(Split::Late, ck_rf)];
                                            if at.is_finite() {
                                                cands.push((Split::Late, ck_rf, at + d_slack));
                                            }
                                        }
                                        Split::Late => {
                                            let at = self.nodes[id].at[(Split::Early, ck_rf)];
                                            if at.is_finite() {
                                                cands.push((Split::Early, ck_rf, at - d_slack));
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }

            let node = &mut self.nodes[id];
            node.reset_rat();
            for (el, rf, rat) in cands {
                el.relax_backward(&mut node.rat[(el, rf)], rat);
            }
        }
    }

    // --- design-wide numbers ---------------------------------------------

    fn update_tns(&mut self, el: Split, rf: Trans) {
        if self.tns_valid[(el, rf)] {
            return;
        }
        let slacks: Vec<f64> = self.nodes.values().map(|n| n.slack(el, rf)).collect();
        let tns: f64 = slacks
            .par_iter()
            .filter(|s| s.is_finite() && **s < 0.0)
            .sum();
        self.tns[(el, rf)] = tns;
        self.tns_valid[(el, rf)] = true;
    }

    fn update_wns(&mut self, el: Split, rf: Trans) {
        if self.wns_valid[(el, rf)] {
            return;
        }
        let slacks: Vec<f64> = self.nodes.values().map(|n| n.slack(el, rf)).collect();
        let wns = slacks
            .par_iter()
            .filter(|s| s.is_finite() && **s < 0.0)
            .copied()
            .reduce(|| 0.0, f64::min);
        self.wns[(el, rf)] = wns;
        self.wns_valid[(el, rf)] = true;
    }

    // --- queries ---------------------------------------------------------

    /// Arrival time at a pin. Returns the undefined sentinel when no
    /// transition reaches the pin.
    pub fn at(&mut self, pin_name: &str, el: Split, rf: Trans) -> TimingResult<f64> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        self.update_timing(true);
        Ok(self.nodes[self.pins[pid].node].at[(el, rf)])
    }

    /// Transition time at a pin.
    pub fn slew(&mut self, pin_name: &str, el: Split, rf: Trans) -> TimingResult<f64> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        self.update_timing(true);
        Ok(self.nodes[self.pins[pid].node].slew[(el, rf)])
    }

    /// Required arrival time at a pin.
    pub fn rat(&mut self, pin_name: &str, el: Split, rf: Trans) -> TimingResult<f64> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        self.update_timing(true);
        Ok(self.nodes[self.pins[pid].node].rat[(el, rf)])
    }

    /// Timing slack at a pin, positive meaning safe, clipped for report.
    pub fn slack(&mut self, pin_name: &str, el: Split, rf: Trans) -> TimingResult<f64> {
        let pid = self
            .pin_id(pin_name)
            .ok_or_else(|| TimingError::MissingPin(pin_name.to_string()))?;
        self.update_timing(true);
        Ok(self.nodes[self.pins[pid].node].slack(el, rf).clamp(-CLIP, CLIP))
    }

    /// Total negative slack on one split/transition pair.
    pub fn tns_at(&mut self, el: Split, rf: Trans) -> f64 {
        self.update_timing(true);
        self.update_tns(el, rf);
        self.tns[(el, rf)].clamp(-CLIP, CLIP)
    }

    /// Design-wide total negative slack, summed over all four pairs.
    pub fn tns(&mut self) -> f64 {
        split_trans().map(|(el, rf)| self.tns_at(el, rf)).sum()
    }

    /// Worst negative slack on one split/transition pair.
    pub fn wns_at(&mut self, el: Split, rf: Trans) -> f64 {
        self.update_timing(true);
        self.update_wns(el, rf);
        self.wns[(el, rf)].clamp(-CLIP, CLIP)
    }

    /// Design-wide worst negative slack over all four pairs.
    pub fn wns(&mut self) -> f64 {
        split_trans()
            .map(|(el, rf)| self.wns_at(el, rf))
            .fold(0.0, f64::min)
    }

    /// Tests in the fanout cone of a pin, following non-constraint edges.
    pub(crate) fn fanout_tests(&self, through: PinId) -> Vec<TestId> {
        let mut out = Vec::new();
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue = VecDeque::new();
        let start = self.pins[through].node;
        visited.insert(start);
        queue.push_back(start);
        while let Some(u) = queue.pop_front() {
            if let Some(tid) = self.pins[self.nodes[u].pin].test {
                out.push(tid);
            }
            for &eid in &self.nodes[u].fanout {
                let edge = &self.edges[eid];
                if edge.kind.is_constraint() {
                    continue;
                }
                if visited.insert(edge.to) {
                    queue.push_back(edge.to);
                }
            }
        }
        out
    }

    /// The `k` worst endpoints by slack, optionally restricted to the
    /// fanout cone of a pin. An unknown through-pin yields an empty list.
    pub fn worst_endpoints(&mut self, through: Option<&str>, k: usize) -> Vec<EndpointReport> {
        self.update_timing(true);
        let endpoints: Vec<Endpoint> = match through {
            None => self.heap.top_k(&mut self.tests, k),
            Some(name) => {
                let Some(pid) = self.pin_id(name) else {
                    self.warn(
                        Category::Timing,
                        7,
                        format!("worst-endpoint query through unknown pin \"{name}\""),
                    );
                    return Vec::new();
                };
                let mut eps: Vec<Endpoint> = self
                    .fanout_tests(pid)
                    .into_iter()
                    .flat_map(|tid| {
                        split_trans().map(move |(el, rf)| Endpoint { test: tid, el, rf })
                    })
                    .filter(|ep| {
                        self.tests[ep.test].slack[(ep.el, ep.rf)] <= self.cutoff[(ep.el, ep.rf)]
                    })
                    .collect();
                eps.sort_by(|a, b| {
                    let sa = self.tests[a.test].slack[(a.el, a.rf)];
                    let sb = self.tests[b.test].slack[(b.el, b.rf)];
                    sa.partial_cmp(&sb).unwrap_or(std::cmp::Ordering::Equal)
                });
                eps.truncate(k);
                eps
            }
        };
        endpoints
            .into_iter()
            .map(|ep| {
                let test = &self.tests[ep.test];
                EndpointReport {
                    pin: self.resolve(self.pins[test.constrained_pin()].name).to_string(),
                    split: ep.el,
                    trans: ep.rf,
                    slack: test.slack[(ep.el, ep.rf)].clamp(-CLIP, CLIP),
                }
            })
            .collect()
    }

    /// The `k` worst post-CPPR slack paths, optionally restricted to
    /// paths through a pin. An unknown through-pin yields an empty list.
    pub fn worst_paths(&mut self, through: Option<&str>, k: usize) -> Vec<Path> {
        self.update_timing(true);
        let through_pid = match through {
            None => None,
            Some(name) => match self.pin_id(name) {
                Some(pid) => Some(pid),
                None => {
                    self.warn(
                        Category::Timing,
                        7,
                        format!("worst-path query through unknown pin \"{name}\""),
                    );
                    return Vec::new();
                }
            },
        };
        path::worst_paths(self, through_pid, k)
    }

    // --- statistics and checks -------------------------------------------

    /// Number of pins in the design.
    pub fn num_pins(&self) -> usize {
        self.pins.len()
    }

    /// Number of nets in the design.
    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    /// Number of gate instances.
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Number of timing-graph nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of timing-graph edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of jumps currently induced.
    pub fn num_jumps(&self) -> usize {
        self.jumps.len()
    }

    /// Number of timing tests.
    pub fn num_tests(&self) -> usize {
        self.tests.len()
    }

    /// Number of primary inputs.
    pub fn num_primary_inputs(&self) -> usize {
        self.pis.len()
    }

    /// Number of primary outputs.
    pub fn num_primary_outputs(&self) -> usize {
        self.pos.len()
    }

    /// Number of nodes in the derived clock tree.
    pub fn clock_tree_size(&self) -> usize {
        self.clock.size()
    }

    /// Depth of the derived clock tree in edges.
    pub fn clock_tree_depth(&self) -> i32 {
        self.clock.depth()
    }

    /// Verifies the structural invariants of the timing graph: the
    /// non-constraint subgraph is acyclic, and after an update every
    /// edge goes from a lower level to a strictly higher one.
    pub fn check_graph(&self) -> TimingResult<()> {
        for (_, edge) in self.edges.iter() {
            if self.nodes[edge.from].level >= self.nodes[edge.to].level {
                return Err(TimingError::BadTopology(format!(
                    "edge level inversion: {} -> {}",
                    self.nodes[edge.from].level, self.nodes[edge.to].level
                )));
            }
        }
        let mut indeg: HashMap<NodeId, usize> = HashMap::new();
        for (id, node) in self.nodes.iter() {
            let n = node
                .fanin
                .iter()
                .filter(|&&e| !self.edges[e].kind.is_constraint())
                .count();
            indeg.insert(id, n);
        }
        let mut queue: VecDeque<NodeId> = indeg
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut seen = 0usize;
        while let Some(u) = queue.pop_front() {
            seen += 1;
            for &eid in &self.nodes[u].fanout {
                let edge = &self.edges[eid];
                if edge.kind.is_constraint() {
                    continue;
                }
                let d = indeg.get_mut(&edge.to).expect("all nodes counted");
                *d -= 1;
                if *d == 0 {
                    queue.push_back(edge.to);
                }
            }
        }
        if seen != self.nodes.len() {
            return Err(TimingError::BadTopology(
                "cycle in the non-constraint timing graph".to_string(),
            ));
        }
        Ok(())
    }
}

/// Finds the counterpart of `old_arcs[idx]` within `new_arcs`: the arc
/// with the same related pin and check kind, disambiguating repeats by
/// ordinal so a cellpin with several arcs from one related pin keeps a
/// stable pairing.
fn matching_arc(old_arcs: &[TimingArc], new_arcs: &[TimingArc], idx: usize) -> Option<usize> {
    let arc = old_arcs.get(idx)?;
    let key = (arc.related_pin.as_str(), arc.is_constraint());
    let ordinal = old_arcs[..idx]
        .iter()
        .filter(|a| (a.related_pin.as_str(), a.is_constraint()) == key)
        .count();
    new_arcs
        .iter()
        .enumerate()
        .filter(|(_, a)| (a.related_pin.as_str(), a.is_constraint()) == key)
        .nth(ordinal)
        .map(|(i, _)| i)
}
