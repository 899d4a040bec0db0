//! Thread-safe diagnostic accumulator.
//!
//! The engine recovers from most bad input on a best-effort basis —
//! assertions on the wrong pin kind, unknown cells turned into blockage
//! placeholders, RC networks that fail to solve — and each recovery
//! leaves a diagnostic here for the caller to drain after the update.
//! Warnings mark operations that proceeded in degraded form; errors mark
//! operations recorded as failed while the design stays queryable. Both
//! tallies are tracked atomically so hot paths can ask "did anything go
//! wrong" without taking the lock.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for engine diagnostics.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    warning_count: AtomicUsize,
    error_count: AtomicUsize,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            warning_count: AtomicUsize::new(0),
            error_count: AtomicUsize::new(0),
        }
    }

    /// Emits a prebuilt diagnostic, updating the severity tallies.
    pub fn emit(&self, diag: Diagnostic) {
        match diag.severity {
            Severity::Warning => {
                self.warning_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Error => {
                self.error_count.fetch_add(1, Ordering::Relaxed);
            }
            Severity::Note => {}
        }
        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.push(diag);
    }

    /// Records a best-effort recovery: the operation proceeded, but in a
    /// degraded form the caller should know about.
    pub fn warning(&self, code: DiagnosticCode, message: impl Into<String>) {
        self.emit(Diagnostic::warning(code, message));
    }

    /// Records a failed operation; the surrounding pass completes so the
    /// design remains queryable with partial results.
    pub fn error(&self, code: DiagnosticCode, message: impl Into<String>) {
        self.emit(Diagnostic::error(code, message));
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// The number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Returns `true` if any warnings have been emitted.
    pub fn has_warnings(&self) -> bool {
        self.warning_count.load(Ordering::Relaxed) > 0
    }

    /// The number of warnings emitted so far.
    pub fn warning_count(&self) -> usize {
        self.warning_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    ///
    /// The tallies are not reset; they track the sink's lifetime.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap();
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without
    /// draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.clone()
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
