//! Cells and cellpins.

use crate::timing::TimingArc;
use serde::{Deserialize, Serialize};

/// The direction of a cellpin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PinDirection {
    /// Signal flows into the cell.
    Input,
    /// Signal flows out of the cell.
    Output,
}

/// A characterized pin of a library cell.
///
/// Timing arcs are owned by the pin they end at, matching the library
/// grouping: delay arcs live on output pins, constraint arcs on the
/// constrained data pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cellpin {
    /// Pin name within the cell (e.g. `"A"`, `"ZN"`).
    pub name: String,
    /// Signal direction.
    pub direction: PinDirection,
    /// Input capacitance presented to the driving net.
    pub capacitance: f64,
    /// Maximum permissible load capacitance.
    pub max_capacitance: f64,
    /// Minimum permissible load capacitance.
    pub min_capacitance: f64,
    /// Maximum permissible transition time.
    pub max_transition: f64,
    /// Minimum permissible transition time.
    pub min_transition: f64,
    /// `true` if this pin is a clock input.
    pub is_clock: bool,
    /// Next-state expression for sequential data pins, if any.
    pub nextstate_type: Option<String>,
    /// Timing arcs ending at this pin.
    pub arcs: Vec<TimingArc>,
}

impl Cellpin {
    /// Creates a pin with default characterization limits and no arcs.
    pub fn new(name: impl Into<String>, direction: PinDirection, capacitance: f64) -> Self {
        Self {
            name: name.into(),
            direction,
            capacitance,
            max_capacitance: f64::MAX,
            min_capacitance: 0.0,
            max_transition: f64::MAX,
            min_transition: 0.0,
            is_clock: false,
            nextstate_type: None,
            arcs: Vec::new(),
        }
    }
}

/// A library cell: a named collection of characterized pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Cell name (e.g. `"NAND2_X1"`).
    pub name: String,
    /// Cell area.
    pub area: f64,
    /// Cell leakage power.
    pub leakage_power: f64,
    /// Pins of the cell, in declaration order.
    pub cellpins: Vec<Cellpin>,
}

impl Cell {
    /// Creates an empty cell.
    ///
    /// A cell with no pins acts as a blockage: gates bound to it carry no
    /// timing arcs.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            area: 0.0,
            leakage_power: 0.0,
            cellpins: Vec::new(),
        }
    }

    /// Looks up a pin by name.
    pub fn cellpin(&self, name: &str) -> Option<&Cellpin> {
        self.cellpins.iter().find(|p| p.name == name)
    }

    /// Returns the position of a pin by name.
    pub fn cellpin_index(&self, name: &str) -> Option<usize> {
        self.cellpins.iter().position(|p| p.name == name)
    }

    /// Returns the first output pin, if any.
    pub fn output_cellpin(&self) -> Option<&Cellpin> {
        self.cellpins
            .iter()
            .find(|p| p.direction == PinDirection::Output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_lookup() {
        let mut cell = Cell::new("INV_X1");
        cell.cellpins
            .push(Cellpin::new("a", PinDirection::Input, 1.5));
        cell.cellpins
            .push(Cellpin::new("o", PinDirection::Output, 0.0));
        assert_eq!(cell.cellpin("a").unwrap().capacitance, 1.5);
        assert!(cell.cellpin("zz").is_none());
        assert_eq!(cell.cellpin_index("o"), Some(1));
        assert_eq!(cell.output_cellpin().unwrap().name, "o");
    }

    #[test]
    fn empty_cell_is_blockage() {
        let cell = Cell::new("ANTENNA");
        assert!(cell.cellpins.is_empty());
        assert!(cell.output_cellpin().is_none());
    }

    #[test]
    fn default_limits() {
        let pin = Cellpin::new("a", PinDirection::Input, 2.0);
        assert_eq!(pin.max_capacitance, f64::MAX);
        assert_eq!(pin.min_transition, 0.0);
        assert!(!pin.is_clock);
    }
}
