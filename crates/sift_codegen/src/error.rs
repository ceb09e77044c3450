//! Error types for code generation.

use std::path::PathBuf;

/// Errors raised by the code generator.
///
/// Path and duplicate-output violations are caller bugs and fail the
/// offending call synchronously; the scheduler escalates them to a
/// build-level failure when a processor propagates them.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// The requested output path escapes the configured output root.
    #[error("output path escapes the output root: {path}")]
    InvalidPath {
        /// The offending relative path.
        path: PathBuf,
    },

    /// The same output was created twice within one build.
    #[error("output file created twice in one build: {path}")]
    DuplicateOutput {
        /// The output path that was created twice.
        path: PathBuf,
    },

    /// An I/O error occurred while creating the output file.
    #[error("failed to create output {path}: {source}")]
    Io {
        /// The output path being created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
