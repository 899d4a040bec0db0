//! Interned design names.
//!
//! The engine resolves every mutator and query through name dictionaries
//! — pins, nets, gates, cells, parasitic nodes. Interning those names
//! once turns dictionary keys into `u32` comparisons and keeps repeated
//! queries against a live design off the string allocator. Cellpin names
//! are qualified with their instance (`"u4:ZN"`) through
//! [`Interner::qualify`] so the full-pin spelling is produced in exactly
//! one place.

use lasso::ThreadedRodeo;
use serde::{Deserialize, Serialize};

/// Separator between a gate instance name and its cellpin name in a
/// full pin name.
pub const PIN_SEPARATOR: char = ':';

/// An interned design name.
///
/// An `Ident` is a `u32` ticket issued by an [`Interner`]; equality and
/// hashing operate on the ticket, so probing a pin or net dictionary
/// never touches the underlying string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Ident(u32);

impl Ident {
    /// Reconstructs an `Ident` from its raw ticket.
    ///
    /// Only meaningful together with the interner that issued the
    /// ticket; intended for deserialization and tests.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` ticket.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: the ticket is a plain `u32` index. Widening it to `usize` is
// lossless on all supported targets, and `try_from_usize` refuses any
// index that would not round-trip back through `into_usize`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Thread-safe design-name interner.
///
/// Backed by [`lasso::ThreadedRodeo`] so parallel reporting passes can
/// resolve names while the single-threaded mutators keep issuing new
/// ones.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Interns a design name, returning its ticket. Re-interning a name
    /// hands back the existing ticket without allocating.
    pub fn get_or_intern(&self, name: &str) -> Ident {
        self.rodeo.get_or_intern(name)
    }

    /// Probes for an existing name without interning it, so queries for
    /// design objects that do not exist cannot grow the table.
    pub fn get(&self, name: &str) -> Option<Ident> {
        self.rodeo.get(name)
    }

    /// Interns the full name of a gate's cellpin,
    /// `<gate><PIN_SEPARATOR><cellpin>`.
    pub fn qualify(&self, gate: &str, cellpin: &str) -> Ident {
        let mut full = String::with_capacity(gate.len() + cellpin.len() + 1);
        full.push_str(gate);
        full.push(PIN_SEPARATOR);
        full.push_str(cellpin);
        self.rodeo.get_or_intern(&full)
    }

    /// Resolves a ticket back to the name it was issued for.
    ///
    /// # Panics
    ///
    /// Panics if the `Ident` was issued by a different interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let interner = Interner::new();
        let id = interner.get_or_intern("inst_4:o");
        assert_eq!(interner.resolve(id), "inst_4:o");
    }

    #[test]
    fn same_name_same_ticket() {
        let interner = Interner::new();
        let a = interner.get_or_intern("nx22");
        let b = interner.get_or_intern("nx22");
        assert_eq!(a, b);
    }

    #[test]
    fn get_does_not_intern() {
        let interner = Interner::new();
        assert_eq!(interner.get("nonexistent_pin"), None);
        let id = interner.get_or_intern("tau2015_clk");
        assert_eq!(interner.get("tau2015_clk"), Some(id));
        assert_eq!(interner.get("nonexistent_pin"), None);
    }

    #[test]
    fn qualify_matches_spelled_out_name() {
        let interner = Interner::new();
        let qualified = interner.qualify("u4", "ZN");
        assert_eq!(qualified, interner.get_or_intern("u4:ZN"));
        assert_eq!(interner.resolve(qualified), "u4:ZN");
    }

    #[test]
    fn qualify_distinguishes_instances() {
        let interner = Interner::new();
        let a = interner.qualify("inst_0", "a");
        let b = interner.qualify("inst_1", "a");
        assert_ne!(a, b);
    }
}
