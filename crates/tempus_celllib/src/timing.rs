//! Timing arcs: the characterized pin-to-pin timing of a cell.
//!
//! A timing arc connects a related (from) cellpin to the cellpin that owns
//! it and bundles up to six lookup tables: rise/fall delay, rise/fall
//! output transition, and rise/fall constraint. Delay arcs drive signal
//! propagation through a gate; constraint arcs define setup/hold checks
//! and never propagate arrival times.

use crate::lut::{LutVariable, TimingLut};
use serde::{Deserialize, Serialize};
use tempus_common::Trans;

/// The unateness of a timing arc.
///
/// Unateness decides which input/output transition pairs an arc defines:
/// positive unate arcs preserve the transition, negative unate arcs invert
/// it, and non-unate arcs (e.g. clock-to-output) define all four pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingSense {
    /// Output transition follows the input transition.
    PositiveUnate,
    /// Output transition inverts the input transition.
    NegativeUnate,
    /// All transition pairs are defined.
    NonUnate,
}

/// The kind of a timing arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingType {
    /// Ordinary input-to-output propagation through combinational logic.
    Combinational,
    /// Clock-to-output propagation launched by a rising clock edge.
    RisingEdge,
    /// Clock-to-output propagation launched by a falling clock edge.
    FallingEdge,
    /// Setup check against a rising clock edge.
    SetupRising,
    /// Setup check against a falling clock edge.
    SetupFalling,
    /// Hold check against a rising clock edge.
    HoldRising,
    /// Hold check against a falling clock edge.
    HoldFalling,
}

impl TimingType {
    /// Returns `true` for setup/hold checks.
    pub fn is_constraint(self) -> bool {
        matches!(
            self,
            TimingType::SetupRising
                | TimingType::SetupFalling
                | TimingType::HoldRising
                | TimingType::HoldFalling
        )
    }

    /// Returns `true` for setup checks.
    pub fn is_setup(self) -> bool {
        matches!(self, TimingType::SetupRising | TimingType::SetupFalling)
    }

    /// Returns `true` for hold checks.
    pub fn is_hold(self) -> bool {
        matches!(self, TimingType::HoldRising | TimingType::HoldFalling)
    }

    /// The clock transition this arc is triggered or related to, if the
    /// arc is edge-sensitive.
    pub fn trigger(self) -> Option<Trans> {
        match self {
            TimingType::RisingEdge | TimingType::SetupRising | TimingType::HoldRising => {
                Some(Trans::Rise)
            }
            TimingType::FallingEdge | TimingType::SetupFalling | TimingType::HoldFalling => {
                Some(Trans::Fall)
            }
            TimingType::Combinational => None,
        }
    }
}

/// A characterized timing arc from a related cellpin to its owning cellpin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingArc {
    /// Name of the related (from) cellpin.
    pub related_pin: String,
    /// Unateness of the arc.
    pub sense: TimingSense,
    /// Kind of the arc.
    pub kind: TimingType,
    /// Delay table for a rising output.
    pub cell_rise: Option<TimingLut>,
    /// Delay table for a falling output.
    pub cell_fall: Option<TimingLut>,
    /// Output transition table for a rising output.
    pub rise_transition: Option<TimingLut>,
    /// Output transition table for a falling output.
    pub fall_transition: Option<TimingLut>,
    /// Constraint table for a rising constrained pin.
    pub rise_constraint: Option<TimingLut>,
    /// Constraint table for a falling constrained pin.
    pub fall_constraint: Option<TimingLut>,
}

impl TimingArc {
    /// Returns `true` for setup/hold arcs.
    pub fn is_constraint(&self) -> bool {
        self.kind.is_constraint()
    }

    /// Returns whether the arc defines the `(irf, orf)` transition pair.
    ///
    /// For delay arcs `irf`/`orf` are the input and output transitions;
    /// unateness and edge sensitivity suppress the forbidden pairs. For
    /// constraint arcs `irf` is the related (clock) transition and `orf`
    /// the constrained (data) transition.
    pub fn is_transition_defined(&self, irf: Trans, orf: Trans) -> bool {
        if self.is_constraint() {
            return self.kind.trigger() == Some(irf) && self.constraint_lut(orf).is_some();
        }
        if let Some(trigger) = self.kind.trigger() {
            if irf != trigger {
                return false;
            }
        }
        let sense_ok = match self.sense {
            TimingSense::PositiveUnate => irf == orf,
            TimingSense::NegativeUnate => irf != orf,
            TimingSense::NonUnate => true,
        };
        sense_ok && self.delay_lut(orf).is_some()
    }

    /// Evaluates the arc delay for the `(irf, orf)` pair at the given
    /// input slew and output load. `None` if the pair is not defined.
    pub fn delay(&self, irf: Trans, orf: Trans, slew: f64, load: f64) -> Option<f64> {
        if !self.is_transition_defined(irf, orf) {
            return None;
        }
        let lut = self.delay_lut(orf)?;
        Some(eval_delay_style(lut, slew, load))
    }

    /// Evaluates the output slew for the `(irf, orf)` pair at the given
    /// input slew and output load. `None` if the pair is not defined.
    pub fn slew(&self, irf: Trans, orf: Trans, slew: f64, load: f64) -> Option<f64> {
        if !self.is_transition_defined(irf, orf) {
            return None;
        }
        let lut = self.transition_lut(orf)?;
        Some(eval_delay_style(lut, slew, load))
    }

    /// Evaluates the constraint guard for a check with the given related
    /// (clock) and constrained (data) transitions and slews. `None` if the
    /// pair is not defined.
    pub fn constraint(
        &self,
        ck_rf: Trans,
        d_rf: Trans,
        related_slew: f64,
        constrained_slew: f64,
    ) -> Option<f64> {
        if !self.is_transition_defined(ck_rf, d_rf) {
            return None;
        }
        let lut = self.constraint_lut(d_rf)?;
        Some(eval_constraint_style(lut, related_slew, constrained_slew))
    }

    fn delay_lut(&self, orf: Trans) -> Option<&TimingLut> {
        match orf {
            Trans::Rise => self.cell_rise.as_ref(),
            Trans::Fall => self.cell_fall.as_ref(),
        }
    }

    fn transition_lut(&self, orf: Trans) -> Option<&TimingLut> {
        match orf {
            Trans::Rise => self.rise_transition.as_ref(),
            Trans::Fall => self.fall_transition.as_ref(),
        }
    }

    fn constraint_lut(&self, d_rf: Trans) -> Option<&TimingLut> {
        match d_rf {
            Trans::Rise => self.rise_constraint.as_ref(),
            Trans::Fall => self.fall_constraint.as_ref(),
        }
    }
}

/// Routes `(slew, load)` onto the axes of a delay-style table according to
/// its template variables.
fn eval_delay_style(lut: &TimingLut, slew: f64, load: f64) -> f64 {
    match lut.variable1 {
        Some(LutVariable::TotalOutputNetCapacitance) => lut.value(load, slew),
        Some(LutVariable::InputNetTransition) => lut.value(slew, load),
        _ => lut.value(load, slew),
    }
}

/// Routes `(related_slew, constrained_slew)` onto the axes of a
/// constraint-style table according to its template variables.
fn eval_constraint_style(lut: &TimingLut, related_slew: f64, constrained_slew: f64) -> f64 {
    match lut.variable1 {
        Some(LutVariable::ConstrainedPinTransition) => lut.value(constrained_slew, related_slew),
        Some(LutVariable::RelatedPinTransition) => lut.value(related_slew, constrained_slew),
        _ => lut.value(related_slew, constrained_slew),
    }
}
