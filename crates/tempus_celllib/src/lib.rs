//! Cell characterization model for the Tempus timing engine.
//!
//! This crate holds the structured form of a characterization library as
//! the engine consumes it from an external Liberty parser: lookup tables
//! with their template variables, timing arcs bundling delay / slew /
//! constraint tables, cellpins, cells, and the library dictionary.
//!
//! The engine is always built against two libraries — an optimistic
//! *early* library and a pessimistic *late* library — that are
//! structurally identical (same cells, pins, and arc topology) and differ
//! only in table values.

#![warn(missing_docs)]

pub mod cell;
pub mod library;
pub mod lut;
pub mod timing;

pub use cell::{Cell, Cellpin, PinDirection};
pub use library::CellLib;
pub use lut::{LutVariable, TimingLut};
pub use timing::{TimingArc, TimingSense, TimingType};
