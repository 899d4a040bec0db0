//! Structured diagnostics for the Tempus timing engine.
//!
//! The engine never logs through a process-wide facility; each [`Timer`]
//! instance owns a thread-safe [`DiagnosticSink`] and every warning or
//! recovered error is emitted there as a structured [`Diagnostic`] for the
//! caller to drain.
//!
//! [`Timer`]: https://docs.rs/tempus_timing

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
