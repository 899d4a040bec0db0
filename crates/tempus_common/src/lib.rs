//! Shared foundational types for the Tempus timing engine.
//!
//! This crate provides the slotted index arena used by every entity store
//! in the engine, the early/late × rise/fall split axes that index nearly
//! all timing quantities, and interned identifiers for design names.

#![warn(missing_docs)]

pub mod arena;
pub mod ident;
pub mod split;

pub use arena::{Arena, ArenaId};
pub use ident::{Ident, Interner, PIN_SEPARATOR};
pub use split::{split_trans, Split, SplitTrans, Trans, CLIP};
