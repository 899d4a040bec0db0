//! K-worst-path enumeration.
//!
//! Paths through an endpoint are ordered by an implicit suffix tree: the
//! base path follows the dominant fanin recorded during arrival
//! relaxation, and every other path is the base plus a sequence of
//! sidetracks, each deviating onto a non-dominant fanin arc at a
//! nonnegative slack cost. A min-heap over candidates pops paths in
//! non-decreasing pre-CPPR slack; per-endpoint results are produced in
//! parallel worker chunks and coalesced into one K-sorted cache.

use crate::cppr;
use crate::ids::{NodeId, PinId};
use crate::test::{Endpoint, TestKind};
use crate::timer::Timer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tempus_common::{split_trans, Split, Trans, CLIP};

/// What kind of check a reported path ends at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathKind {
    /// A late-split sequential setup check.
    Setup,
    /// An early-split sequential hold check.
    Hold,
    /// A required-time assertion at a primary output.
    Rat,
}

/// One step of a reported path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathStep {
    /// Pin name.
    pub pin: String,
    /// Signal transition at the pin.
    pub trans: Trans,
}

/// A reported end-to-end path, source first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Path {
    /// The check the path ends at.
    pub kind: PathKind,
    /// The timing split of the check.
    pub split: Split,
    /// Post-CPPR slack of this path, clipped for report.
    pub slack: f64,
    /// The pin/transition trace from source to endpoint.
    pub steps: Vec<PathStep>,
}

/// A sidetrack-augmented candidate during enumeration. The trace runs
/// endpoint-first; `dev_from` is the first position at which children may
/// deviate, which makes every generated path unique.
struct Candidate {
    slack: f64,
    trace: Vec<(NodeId, Trans)>,
    dev_from: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.slack == other.slack
    }
}
impl Eq for Candidate {}
impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the smallest slack first.
        other
            .slack
            .partial_cmp(&self.slack)
            .unwrap_or(Ordering::Equal)
    }
}

/// Expansion budget per endpoint: candidates popped before the search
/// gives up looking for through-pin matches.
const MAX_POPS_PER_ENDPOINT: usize = 4096;

/// Enumerates the K worst post-CPPR paths, optionally restricted to
/// paths containing `through`.
pub(crate) fn worst_paths(timer: &Timer, through: Option<PinId>, k: usize) -> Vec<Path> {
    if k == 0 {
        return Vec::new();
    }

    // Candidate endpoints at or below the cutoff, worst first.
    let tests: Vec<_> = match through {
        Some(pid) => timer.fanout_tests(pid),
        None => timer.tests.ids().collect(),
    };
    let mut endpoints: Vec<(Endpoint, f64)> = tests
        .iter()
        .flat_map(|&tid| split_trans().map(move |(el, rf)| Endpoint { test: tid, el, rf }))
        .filter_map(|ep| {
            let slack = timer.tests[ep.test].slack[(ep.el, ep.rf)];
            (slack <= timer.cutoff[(ep.el, ep.rf)] && slack.is_finite()).then_some((ep, slack))
        })
        .collect();
    endpoints.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    if endpoints.is_empty() {
        return Vec::new();
    }

    // One worker per chunk, each with its own bounded collection; a
    // worker stops early once its K paths all beat the next endpoint.
    let workers = rayon::current_num_threads().max(1);
    let chunk = endpoints.len().div_ceil(workers);
    let mut cache: Vec<Path> = endpoints
        .par_chunks(chunk)
        .map(|eps| {
            let mut local: Vec<Path> = Vec::new();
            for &(ep, slack) in eps {
                if local.len() >= k {
                    let kth = local.last().map_or(f64::INFINITY, |p| p.slack);
                    if slack >= kth {
                        break;
                    }
                }
                local.extend(enumerate_endpoint(timer, ep, k, through));
                local.sort_by(|a, b| a.slack.partial_cmp(&b.slack).unwrap_or(Ordering::Equal));
                local.truncate(k);
            }
            local
        })
        .reduce(Vec::new, |mut a, b| {
            a.extend(b);
            a
        });

    cache.sort_by(|a, b| a.slack.partial_cmp(&b.slack).unwrap_or(Ordering::Equal));
    cache.truncate(k);
    cache
}

/// K-shortest traversal of one endpoint's suffix tree.
fn enumerate_endpoint(timer: &Timer, ep: Endpoint, k: usize, through: Option<PinId>) -> Vec<Path> {
    let test = &timer.tests[ep.test];
    let end_node = timer.pins[test.constrained_pin()].node;
    if !timer.nodes[end_node].at[(ep.el, ep.rf)].is_finite() {
        return Vec::new();
    }

    let kind = match test.kind {
        TestKind::PrimaryOutput { .. } => PathKind::Rat,
        TestKind::Sequential { .. } => match ep.el {
            Split::Late => PathKind::Setup,
            Split::Early => PathKind::Hold,
        },
    };
    let base_slack = test.raw_slack[(ep.el, ep.rf)];
    if !base_slack.is_finite() {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Candidate> = BinaryHeap::new();
    heap.push(Candidate {
        slack: base_slack,
        trace: backtrace(timer, end_node, ep.rf, ep.el),
        dev_from: 0,
    });

    let mut out = Vec::new();
    let mut pops = 0;
    while let Some(cand) = heap.pop() {
        pops += 1;
        if out.len() >= k || pops > MAX_POPS_PER_ENDPOINT {
            break;
        }

        let matches_through = match through {
            None => true,
            Some(pid) => cand.trace.iter().any(|&(n, _)| timer.nodes[n].pin == pid),
        };
        if matches_through {
            out.push(emit(timer, ep, kind, &cand));
        }

        // Children: one new sidetrack per unexplored deviation along the
        // remaining trace.
        for i in cand.dev_from..cand.trace.len() {
            let (v, vrf) = cand.trace[i];
            let dominant = timer.nodes[v].at_from[(ep.el, vrf)];
            let at_v = timer.nodes[v].at[(ep.el, vrf)];
            if !at_v.is_finite() {
                continue;
            }
            for &eid in &timer.nodes[v].fanin {
                let edge = &timer.edges[eid];
                if edge.kind.is_constraint() {
                    continue;
                }
                for irf in Trans::ALL {
                    if dominant == Some((eid, irf)) {
                        continue;
                    }
                    let Some(d) = edge.delay.get(ep.el, irf, vrf) else {
                        continue;
                    };
                    let at_u = timer.nodes[edge.from].at[(ep.el, irf)];
                    if !at_u.is_finite() {
                        continue;
                    }
                    let cost = match ep.el {
                        Split::Late => at_v - (at_u + d),
                        Split::Early => (at_u + d) - at_v,
                    };
                    let mut trace = cand.trace[..=i].to_vec();
                    trace.extend(backtrace(timer, edge.from, irf, ep.el));
                    heap.push(Candidate {
                        slack: cand.slack + cost.max(0.0),
                        trace,
                        dev_from: i + 1,
                    });
                }
            }
        }
    }
    out
}

/// Follows dominant fanins backward from `(node, rf)` to a source,
/// endpoint-first.
fn backtrace(timer: &Timer, node: NodeId, rf: Trans, el: Split) -> Vec<(NodeId, Trans)> {
    let mut trace = vec![(node, rf)];
    let (mut v, mut vrf) = (node, rf);
    while let Some((eid, irf)) = timer.nodes[v].at_from[(el, vrf)] {
        v = timer.edges[eid].from;
        vrf = irf;
        trace.push((v, vrf));
    }
    trace
}

fn emit(timer: &Timer, ep: Endpoint, kind: PathKind, cand: &Candidate) -> Path {
    let credit = match kind {
        PathKind::Rat => 0.0,
        PathKind::Setup | PathKind::Hold => {
            cppr::credit_for_trace(timer, ep.test, ep.el, &cand.trace)
        }
    };
    let steps = cand
        .trace
        .iter()
        .rev()
        .map(|&(n, rf)| PathStep {
            pin: timer.resolve(timer.pins[timer.nodes[n].pin].name).to_string(),
            trans: rf,
        })
        .collect();
    Path {
        kind,
        split: ep.el,
        slack: (cand.slack + credit).clamp(-CLIP, CLIP),
        steps,
    }
}
