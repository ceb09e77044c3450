//! Engine-level error taxonomy and exit-code mapping.

use crate::processor::ProcessorError;
use sift_codegen::CodegenError;
use sift_common::InternalError;
use sift_incremental::CacheError;
use std::path::PathBuf;

/// Ways a build can fail.
///
/// An unresolvable symbol is not represented here: validation reports it
/// as `false` and the processor decides whether to defer or to emit an
/// error diagnostic.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A processor hook returned an error.
    #[error("processor '{name}' failed in round {round}: {source}")]
    Processor {
        /// The failing processor's name.
        name: String,
        /// The round in which the failure happened; 0 for `init`.
        round: u32,
        /// The error the processor returned.
        source: ProcessorError,
    },

    /// Processors ran to completion but emitted error diagnostics.
    #[error("processing failed with {count} error(s)")]
    ProcessorsReportedErrors {
        /// Number of error diagnostics emitted.
        count: usize,
    },

    /// The build did not reach a fixpoint within the round cap.
    #[error("processing did not converge after {rounds} rounds")]
    NonConvergence {
        /// The configured round cap.
        rounds: u32,
    },

    /// A code-generation failure outside any processor hook.
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// An incremental-cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The frontend failed to parse source files.
    #[error("frontend failed to parse sources: {source}")]
    Frontend {
        /// The error the frontend returned.
        source: ProcessorError,
    },

    /// An I/O failure while scanning sources or touching outputs.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An internal invariant violation.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl EngineError {
    /// Maps the error to the driver exit code: 1 for processing errors
    /// (the processors or their diagnostics), 2 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::Processor { .. } | EngineError::ProcessorsReportedErrors { .. } => 1,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processor_failures_map_to_exit_one() {
        let err = EngineError::Processor {
            name: "demo".to_string(),
            round: 2,
            source: "boom".into(),
        };
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("demo"));
        assert!(err.to_string().contains("round 2"));

        let err = EngineError::ProcessorsReportedErrors { count: 3 };
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn infrastructure_failures_map_to_exit_two() {
        assert_eq!(EngineError::NonConvergence { rounds: 100 }.exit_code(), 2);
        assert_eq!(
            EngineError::Internal(InternalError::new("bad state")).exit_code(),
            2
        );
    }
}
