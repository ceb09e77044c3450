//! Error types for incremental-cache operations.

use std::path::PathBuf;

/// Errors that can occur while reading or writing the incremental caches.
///
/// Reads are fail-safe: a missing or corrupt cache is reported as a cache
/// miss (full rebuild), not an error. This enum covers write-side failures
/// and output cleanup, which must be surfaced to the driver.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error while reading or writing cache or output files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization failure.
    #[error("lookup store serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}
