//! Structured diagnostic messages emitted by processors and the scheduler.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A diagnostic message with severity and optional origin information.
///
/// Each diagnostic carries the file it refers to (if any) and the name of
/// the processor that emitted it, so a failed build can report exactly
/// which processor and which input were involved.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The main diagnostic message.
    pub message: String,
    /// The source or generated file this diagnostic refers to, if any.
    pub file: Option<PathBuf>,
    /// The name of the processor that emitted this diagnostic, if any.
    pub processor: Option<String>,
}

impl Diagnostic {
    /// Creates a new diagnostic with the given severity and message.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            file: None,
            processor: None,
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Creates a new informational diagnostic.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Attaches the file this diagnostic refers to.
    pub fn with_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    /// Attaches the name of the emitting processor.
    pub fn with_processor(mut self, processor: impl Into<String>) -> Self {
        self.processor = Some(processor.into());
        self
    }
}
