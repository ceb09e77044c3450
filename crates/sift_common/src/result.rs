//! Common result and error types for the sift engine.

/// The standard result type for fallible internal operations.
///
/// `Err` indicates an unrecoverable internal error (a bug in sift), not a
/// processor or user error. Processor failures are surfaced through the
/// engine's own error types and the diagnostic sink.
pub type SiftResult<T> = Result<T, InternalError>;

/// An internal engine error indicating a bug in sift itself.
///
/// These should never occur during normal operation; the driver maps them
/// to its "internal error" exit code rather than the processing-error code.
#[derive(Debug, thiserror::Error)]
#[error("internal engine error: {message}")]
pub struct InternalError {
    /// Description of the internal error.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
