//! The cell library dictionary.

use crate::cell::Cell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A characterization library: a named dictionary of cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellLib {
    /// Library name.
    pub name: String,
    cells: HashMap<String, Cell>,
}

impl CellLib {
    /// Creates an empty library.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: HashMap::new(),
        }
    }

    /// Inserts a cell, replacing any existing cell with the same name.
    pub fn insert_cell(&mut self, cell: Cell) -> &Cell {
        let name = cell.name.clone();
        self.cells.insert(name.clone(), cell);
        &self.cells[&name]
    }

    /// Inserts an empty placeholder cell for an unknown name.
    ///
    /// The placeholder has no pins and therefore no timing arcs; gates
    /// bound to it behave as blockages.
    pub fn insert_placeholder(&mut self, name: &str) -> &Cell {
        self.cells
            .entry(name.to_string())
            .or_insert_with(|| Cell::new(name));
        &self.cells[name]
    }

    /// Looks up a cell by name.
    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.cells.get(name)
    }

    /// Returns the number of cells.
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Iterates over the cells in arbitrary order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }
}
