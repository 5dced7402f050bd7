//! Structured build diagnostics and the helpers that create them.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;

/// The subsystem a diagnostic originated from.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// General build pipeline diagnostics.
    Build,
    /// Module bundling diagnostics.
    Bundle,
    /// Style compilation diagnostics.
    Style,
    /// Diagnostics forwarded from the component runtime.
    Runtime,
}

/// A structured diagnostic message produced during a build.
///
/// Diagnostics are the only failure channel of the pipeline: phase errors,
/// disk failures, and plugin failures all end up here rather than
/// propagating out of the build entry point.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The subsystem that produced this diagnostic.
    pub kind: DiagnosticKind,
    /// A short header, typically naming the phase or plugin that failed.
    pub header: String,
    /// The main diagnostic message.
    pub message: String,
    /// Absolute path of the file the diagnostic refers to, if any.
    pub abs_file_path: Option<String>,
    /// Project-relative path of the file the diagnostic refers to, if any.
    pub rel_file_path: Option<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(kind: DiagnosticKind, header: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            header: header.into(),
            message: message.into(),
            abs_file_path: None,
            rel_file_path: None,
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warn(kind: DiagnosticKind, header: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warn,
            kind,
            header: header.into(),
            message: message.into(),
            abs_file_path: None,
            rel_file_path: None,
        }
    }

    /// Attaches the file this diagnostic refers to.
    pub fn with_file(mut self, abs_path: impl Into<String>) -> Self {
        self.abs_file_path = Some(abs_path.into());
        self
    }
}

/// Appends a build error diagnostic and returns a mutable reference to it.
pub fn build_error(diagnostics: &mut Vec<Diagnostic>) -> &mut Diagnostic {
    diagnostics.push(Diagnostic::error(DiagnosticKind::Build, "build error", "build error"));
    let idx = diagnostics.len() - 1;
    &mut diagnostics[idx]
}

/// Appends a build warning diagnostic and returns a mutable reference to it.
pub fn build_warn(diagnostics: &mut Vec<Diagnostic>) -> &mut Diagnostic {
    diagnostics.push(Diagnostic::warn(DiagnosticKind::Build, "build warn", "build warn"));
    let idx = diagnostics.len() - 1;
    &mut diagnostics[idx]
}

/// Normalizes an arbitrary error into an error diagnostic whose header
/// names the phase (or plugin) in which it occurred.
///
/// This is the single funnel through which phase failures become part of
/// the build result instead of propagating out of the pipeline.
pub fn catch_error(diagnostics: &mut Vec<Diagnostic>, phase: &str, err: impl Display) {
    diagnostics.push(Diagnostic::error(
        DiagnosticKind::Build,
        format!("{phase} error"),
        err.to_string(),
    ));
}

/// Removes duplicate diagnostics, preserving first-seen order.
///
/// Two diagnostics are duplicates when severity, header, and message all
/// match. Repeated failures of the same kind (e.g., the same unreadable
/// file hit by several bundles) collapse to one report.
pub fn clean_diagnostics(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = HashSet::new();
    diagnostics
        .into_iter()
        .filter(|d| seen.insert((d.severity, d.header.clone(), d.message.clone())))
        .collect()
}

/// Returns `true` if any non-runtime error diagnostic is present.
///
/// Runtime diagnostics are forwarded from the component runtime and do not
/// fail the build that merely observed them.
pub fn has_error(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error && d.kind != DiagnosticKind::Runtime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_error_defaults() {
        let mut diags = Vec::new();
        build_error(&mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Severity::Error);
        assert_eq!(diags[0].header, "build error");
    }

    #[test]
    fn catch_error_names_phase() {
        let mut diags = Vec::new();
        catch_error(&mut diags, "transpile", "unexpected token");
        assert_eq!(diags[0].header, "transpile error");
        assert_eq!(diags[0].message, "unexpected token");
        assert!(has_error(&diags));
    }

    #[test]
    fn has_error_ignores_warnings() {
        let mut diags = Vec::new();
        build_warn(&mut diags);
        assert!(!has_error(&diags));
    }

    #[test]
    fn has_error_ignores_runtime_errors() {
        let diags = vec![Diagnostic::error(DiagnosticKind::Runtime, "runtime", "boom")];
        assert!(!has_error(&diags));
    }

    #[test]
    fn clean_removes_duplicates() {
        let d = Diagnostic::error(DiagnosticKind::Build, "style error", "missing file");
        let cleaned = clean_diagnostics(vec![d.clone(), d.clone(), d]);
        assert_eq!(cleaned.len(), 1);
    }

    #[test]
    fn clean_preserves_order_and_distinct() {
        let a = Diagnostic::error(DiagnosticKind::Build, "a", "first");
        let b = Diagnostic::warn(DiagnosticKind::Build, "b", "second");
        let cleaned = clean_diagnostics(vec![a.clone(), b.clone(), a]);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].message, "first");
        assert_eq!(cleaned[1].message, "second");
    }

    #[test]
    fn with_file_sets_path() {
        let d = Diagnostic::error(DiagnosticKind::Style, "style error", "bad css")
            .with_file("/src/app.css");
        assert_eq!(d.abs_file_path.as_deref(), Some("/src/app.css"));
    }
}
