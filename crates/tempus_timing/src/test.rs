//! Timing tests and their endpoints.
//!
//! A test constrains one pin: either a sequential setup/hold check on a
//! flip-flop data pin against its related clock pin, or an asserted
//! required time on a primary output. Each test owns four endpoints, one
//! per split/transition pair; an endpoint carries the current slack and
//! its position in the endpoint min-heap.

use crate::ids::{PinId, TestId};
use serde::{Deserialize, Serialize};
use tempus_common::{Split, SplitTrans, Trans};

/// What a test constrains.
#[derive(Debug, Clone, Copy)]
pub enum TestKind {
    /// A setup/hold check at a sequential data pin.
    ///
    /// The early-library arc at `arc` is the hold check, the late-library
    /// arc the setup check; the two libraries are structurally identical.
    Sequential {
        /// The related clock pin.
        related: PinId,
        /// The constrained data pin.
        constrained: PinId,
        /// Index of the constraint arc on the constrained cellpin.
        arc: usize,
    },
    /// A required-time assertion at a primary output.
    PrimaryOutput {
        /// The constrained output pin.
        pin: PinId,
    },
}

/// A timing check with four endpoint views.
#[derive(Debug)]
pub struct Test {
    /// What this test constrains.
    pub kind: TestKind,
    /// Pre-CPPR required time at the constrained pin.
    pub rat: SplitTrans<f64>,
    /// Pre-CPPR endpoint slack.
    pub raw_slack: SplitTrans<f64>,
    /// Endpoint slack after common-path pessimism correction; drives the
    /// endpoint heap and required-time seeding.
    pub slack: SplitTrans<f64>,
    /// The related-pin transition behind each endpoint's worst check.
    pub ck_rf: SplitTrans<Option<Trans>>,
    /// Heap position of each endpoint, when enqueued.
    pub heap_pos: SplitTrans<Option<usize>>,
}

impl Test {
    /// Creates a test with undefined required times and safe slacks.
    pub fn new(kind: TestKind) -> Self {
        Self {
            kind,
            rat: SplitTrans::from_fn(|el, _| el.undefined_rat()),
            raw_slack: SplitTrans::splat(f64::INFINITY),
            slack: SplitTrans::splat(f64::INFINITY),
            ck_rf: SplitTrans::splat(None),
            heap_pos: SplitTrans::splat(None),
        }
    }

    /// The pin this test constrains.
    pub fn constrained_pin(&self) -> PinId {
        match self.kind {
            TestKind::Sequential { constrained, .. } => constrained,
            TestKind::PrimaryOutput { pin } => pin,
        }
    }

    /// Returns `true` for sequential setup/hold tests.
    pub fn is_sequential(&self) -> bool {
        matches!(self.kind, TestKind::Sequential { .. })
    }
}

/// One endpoint: a `(test, split, transition)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// The owning test.
    pub test: TestId,
    /// The timing split of this view.
    pub el: Split,
    /// The transition of this view.
    pub rf: Trans,
}

/// A reported endpoint: the constrained pin with one split/transition
/// view and its current slack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointReport {
    /// Name of the constrained pin.
    pub pin: String,
    /// The timing split of this view.
    pub split: Split,
    /// The transition of this view.
    pub trans: Trans,
    /// Post-CPPR slack, clipped for report.
    pub slack: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempus_common::ArenaId;

    #[test]
    fn new_test_is_safe() {
        let t = Test::new(TestKind::PrimaryOutput {
            pin: PinId::from_raw(0),
        });
        assert_eq!(t.slack[(Split::Late, Trans::Rise)], f64::INFINITY);
        assert!(t.heap_pos[(Split::Early, Trans::Fall)].is_none());
        assert!(!t.is_sequential());
    }

    #[test]
    fn constrained_pin_resolution() {
        let d = PinId::from_raw(7);
        let t = Test::new(TestKind::Sequential {
            related: PinId::from_raw(3),
            constrained: d,
            arc: 0,
        });
        assert_eq!(t.constrained_pin(), d);
        assert!(t.is_sequential());
    }
}
