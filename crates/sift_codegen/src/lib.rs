//! Dependency-tracked code generation.
//!
//! Processors create output files through the [`CodeGenerator`], declaring
//! with a [`Dependencies`] record which input files justify each output.
//! The generator enforces path containment and duplicate-output detection,
//! and maintains the source-to-outputs justification table the incremental
//! subsystem persists across builds.

#![warn(missing_docs)]

pub mod deps;
pub mod error;
pub mod generator;

pub use deps::{Dependencies, OutputKind};
pub use error::CodegenError;
pub use generator::{CodeGenerator, OutputRoots, ANY_CHANGES_WILDCARD};
