//! Thread-safe diagnostic accumulator shared by the scheduler and processors.

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics emitted during processing.
///
/// The error count is tracked atomically so the scheduler's per-round
/// `has_errors` check never locks the diagnostic vector. When constructed
/// with [`with_warnings_as_errors`](Self::with_warnings_as_errors), warnings
/// are promoted to errors at emission time.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
    warnings_as_errors: bool,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
            warnings_as_errors: false,
        }
    }

    /// Creates a sink that promotes warnings to errors at emission time.
    pub fn with_warnings_as_errors() -> Self {
        Self {
            warnings_as_errors: true,
            ..Self::new()
        }
    }

    /// Emits a diagnostic into the sink.
    ///
    /// If the diagnostic has [`Severity::Error`] (possibly after warning
    /// promotion), the error count is incremented atomically.
    pub fn emit(&self, mut diag: Diagnostic) {
        if self.warnings_as_errors && diag.severity == Severity::Warning {
            diag.severity = Severity::Error;
        }
        if diag.severity == Severity::Error {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        let mut diagnostics = self.diagnostics.lock().unwrap();
        diagnostics.push(diag);
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    ///
    /// The error count is left untouched: a build that has erred stays
    /// erred even after the driver drains the messages for rendering.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().unwrap();
        std::mem::take(&mut *diagnostics)
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sink_has_no_errors() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        assert_eq!(sink.error_count(), 0);
    }

    #[test]
    fn emit_error_counts() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error("bad symbol"));
        sink.emit(Diagnostic::warning("shadowed name"));
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn warnings_as_errors_promotes() {
        let sink = DiagnosticSink::with_warnings_as_errors();
        sink.emit(Diagnostic::warning("deprecated annotation"));
        assert!(sink.has_errors());
        let diags = sink.diagnostics();
        assert_eq!(diags[0].severity, Severity::Error);
    }

    #[test]
    fn take_all_drains_but_keeps_error_count() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error("boom"));
        let drained = sink.take_all();
        assert_eq!(drained.len(), 1);
        assert!(sink.diagnostics().is_empty());
        assert!(sink.has_errors());
    }

    #[test]
    fn info_does_not_error() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::info("round 1 of processing"));
        assert!(!sink.has_errors());
    }
}
