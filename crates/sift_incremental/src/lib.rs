//! Cross-build invalidation for incremental symbol processing.
//!
//! This crate persists the lookup maps that associate every source file
//! with the files it depends on, the symbols it references, the symbols it
//! defines, and the outputs it justifies. On the next build, the
//! [`IncrementalContext`] replays those maps against the driver-supplied
//! change list to compute exactly which files must be re-exposed to
//! processors and which generated outputs are stale.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod maps;
pub mod propagate;
pub mod store;

pub use context::{ChangeSet, IncrementalContext};
pub use error::CacheError;
pub use maps::{FileToFilesMap, FileToSymbolsMap, LookupSymbol};
pub use propagate::DirtinessPropagator;
pub use store::LookupStore;
