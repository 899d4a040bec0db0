//! Incremental static timing analysis for gate-level designs.
//!
//! The engine consumes, from external parsers, a structured description
//! of two characterization libraries (optimistic early / pessimistic
//! late), a netlist, per-net RC parasitics, and an initial I/O timing
//! environment. It maintains arrival time, required time, slew, and
//! slack at every pin — per timing split and signal transition — under
//! incremental design mutation, and enumerates the K worst post-CPPR
//! slack paths.
//!
//! # Usage
//!
//! ```ignore
//! use tempus_timing::Timer;
//!
//! let mut timer = Timer::new(early_lib, late_lib);
//! timer.insert_primary_input("inp1")?;
//! timer.insert_gate("u1", "NAND2_X1")?;
//! timer.connect_pin("u1:a", "inp1")?;
//! // ... build the rest of the design, load parasitics, assert I/O timing
//!
//! timer.update_timing(false);
//! println!("wns = {:.3}", timer.wns());
//! for path in timer.worst_paths(None, 2) {
//!     println!("{:?} {:.3}", path.kind, path.slack);
//! }
//! ```
//!
//! # Architecture
//!
//! - [`netlist`] — pins, nets, gates, primary I/O, boundary assertions
//! - [`rctree`] — per-net Elmore delay / PERI slew interconnect solver
//! - [`graph`] — timing-graph nodes, edges, and jump shortcuts
//! - [`pipeline`] — the level-bucketed frontier of invalidated nodes
//! - [`clock`] — the derived clock tree with inversion parities
//! - [`test`] — setup/hold and required-time checks with endpoints
//! - [`heap`] — the endpoint min-heap ordered by slack
//! - `cppr` — common-path pessimism credit (internal)
//! - [`path`] — K-worst-path enumeration
//! - [`timer`] — the engine facade tying the pieces together

#![warn(missing_docs)]

pub mod clock;
mod cppr;
pub mod error;
pub mod graph;
pub mod heap;
pub mod ids;
pub mod netlist;
pub mod path;
pub mod pipeline;
pub mod rctree;
pub mod test;
pub mod timer;

pub use error::{TimingError, TimingResult};
pub use netlist::TimingAssertions;
pub use path::{Path, PathKind, PathStep};
pub use rctree::ParasiticsDesc;
pub use test::EndpointReport;
pub use timer::Timer;

pub use tempus_common::{Split, SplitTrans, Trans};
