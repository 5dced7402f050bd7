//! Build diagnostics: creation, deduplication, accumulation, and rendering.
//!
//! Builds never fail by propagating errors out of the pipeline; every
//! failure is normalized into a [`Diagnostic`] appended to the current
//! build's diagnostic list. This crate provides the diagnostic types, the
//! helpers that convert arbitrary errors into diagnostics, the thread-safe
//! [`DiagnosticSink`] used by parallel phases, and the terminal [`Logger`]
//! with its timing spans.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod logger;
pub mod severity;
pub mod sink;

pub use diagnostic::{
    build_error, build_warn, catch_error, clean_diagnostics, has_error, Diagnostic,
    DiagnosticKind,
};
pub use logger::{LogLevel, Logger, TimeSpan};
pub use severity::Severity;
pub use sink::DiagnosticSink;
