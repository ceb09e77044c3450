//! The sift symbol model: a read-only tree of declaration and type nodes.
//!
//! Declarations supplied by the external compiler frontend are wrapped into
//! arena-allocated [`SymbolNode`]s owned by a per-compilation [`Session`].
//! The session's identity cache guarantees that looking up the same
//! underlying declaration twice yields the same [`NodeId`], so visitation,
//! validation, and caching can rely on plain id equality.

#![warn(missing_docs)]

pub mod node;
pub mod session;
pub mod validate;
pub mod visitor;

pub use node::{
    ClassKind, Modifier, NodeId, SymbolKind, SymbolNode, TypeResolution,
};
pub use session::{NodeKey, Session};
pub use validate::{validate, validate_with};
pub use visitor::{collect_defined_symbols, walk, SymbolVisitor};
