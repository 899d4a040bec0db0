//! Structured diagnostic messages with severity, codes, and notes.

use crate::code::DiagnosticCode;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured diagnostic message.
///
/// Diagnostics are the mechanism for reporting warnings and recovered
/// errors to the caller. The engine has no source text, so a diagnostic
/// names the design object it concerns in its message rather than carrying
/// a source span.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the type of diagnostic.
    pub code: DiagnosticCode,
    /// The main diagnostic message.
    pub message: String,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic with the given code and message.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic with the given code and message.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Creates a new note diagnostic with the given code and message.
    pub fn note(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            code,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    #[test]
    fn error_constructor() {
        let d = Diagnostic::error(
            DiagnosticCode::new(Category::Design, 1),
            "failed to remove connected net",
        );
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.message, "failed to remove connected net");
        assert!(d.notes.is_empty());
    }

    #[test]
    fn warning_with_note() {
        let d = Diagnostic::warning(
            DiagnosticCode::new(Category::Timing, 5),
            "arrival asserted on a non-input pin",
        )
        .with_note("the assertion is applied to the node directly");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.notes.len(), 1);
    }

    #[test]
    fn display_format() {
        let d = Diagnostic::warning(DiagnosticCode::new(Category::Library, 2), "missing cell");
        assert_eq!(format!("{d}"), "warning[L002]: missing cell");
    }

    #[test]
    fn serde_roundtrip() {
        let d = Diagnostic::note(DiagnosticCode::new(Category::Graph, 9), "graph check passed");
        let json = serde_json::to_string(&d).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.message, d.message);
        assert_eq!(back.severity, d.severity);
    }
}
