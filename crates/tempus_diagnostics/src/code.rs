//! Diagnostic codes with category prefixes for structured identification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Design mutation diagnostics (pins, nets, gates), prefixed with `D`.
    Design,
    /// Cell library diagnostics, prefixed with `L`.
    Library,
    /// Parasitics / RC network diagnostics, prefixed with `P`.
    Parasitics,
    /// Timing graph diagnostics, prefixed with `G`.
    Graph,
    /// Timing propagation diagnostics, prefixed with `T`.
    Timing,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Design => 'D',
            Category::Library => 'L',
            Category::Parasitics => 'P',
            Category::Graph => 'G',
            Category::Timing => 'T',
        }
    }
}

/// A structured diagnostic code combining a category prefix and a numeric
/// identifier, displayed as e.g. `D101` or `T042`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_prefixes() {
        assert_eq!(Category::Design.prefix(), 'D');
        assert_eq!(Category::Library.prefix(), 'L');
        assert_eq!(Category::Parasitics.prefix(), 'P');
        assert_eq!(Category::Graph.prefix(), 'G');
        assert_eq!(Category::Timing.prefix(), 'T');
    }

    #[test]
    fn display_format() {
        let code = DiagnosticCode::new(Category::Design, 101);
        assert_eq!(format!("{code}"), "D101");

        let code = DiagnosticCode::new(Category::Timing, 3);
        assert_eq!(format!("{code}"), "T003");
    }

    #[test]
    fn serde_roundtrip() {
        let code = DiagnosticCode::new(Category::Parasitics, 7);
        let json = serde_json::to_string(&code).unwrap();
        let back: DiagnosticCode = serde_json::from_str(&json).unwrap();
        assert_eq!(code, back);
    }
}
