//! Shared foundational types used across the sift symbol-processing engine.
//!
//! This crate provides interned identifiers, content hashing for change
//! detection, and the common result types used by the engine crates.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, SiftResult};
