//! The sift processing engine: round scheduling, the processor API, and
//! the glue between the symbol model, code generation, and the
//! incremental caches.
//!
//! A build driver configures [`EngineOptions`], supplies a [`Frontend`]
//! that turns source paths into symbol nodes, registers its
//! [`SymbolProcessor`]s, and calls [`Engine::run`]. The engine repeats
//! processing rounds until no new source files are generated, then
//! flushes the lookup maps that make the next build incremental.

#![warn(missing_docs)]

pub mod error;
pub mod frontend;
pub mod options;
pub mod processor;
pub mod resolver;
pub mod scheduler;

pub use error::EngineError;
pub use frontend::{Frontend, LookupRecorder};
pub use options::{EngineOptions, EngineOptionsBuilder, DEFAULT_MAX_ROUNDS};
pub use processor::{ProcessorContext, ProcessorError, Round, SymbolProcessor};
pub use resolver::Resolver;
pub use scheduler::{BuildSummary, Engine};
