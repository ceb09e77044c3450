//! Declaration and type nodes of the symbol tree.

use sift_common::Ident;
use std::cell::OnceCell;
use std::path::PathBuf;

/// Opaque identifier of a node in a [`Session`](crate::Session)'s arena.
///
/// Ids are allocation indices; they are stable for the lifetime of the
/// session and serve as the node's identity. Algorithms that need "have I
/// seen this node before" semantics key their sets on `NodeId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a `NodeId` from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Declaration modifiers. Only visibility is interpreted by the engine
/// itself (private declarations are invisible to other files and excluded
/// from symbol collection); the rest are passed through to processors.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Modifier {
    /// Visible everywhere.
    Public,
    /// Visible only within the declaring file or class.
    Private,
    /// Visible to subclasses.
    Protected,
    /// Visible within the module.
    Internal,
    /// Cannot be instantiated directly.
    Abstract,
    /// Open for subclassing.
    Open,
    /// Permits a fixed set of direct subclasses.
    Sealed,
    /// Not tied to an instance.
    Static,
}

/// The flavor of a class-like declaration.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ClassKind {
    /// An ordinary class.
    Class,
    /// An interface.
    Interface,
    /// An enumeration.
    Enum,
    /// A singleton object.
    Object,
    /// An annotation class.
    Annotation,
}

/// The outcome of resolving a type reference through the frontend.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TypeResolution {
    /// The reference resolves to the given declaration node.
    Resolved(NodeId),
    /// The reference could not be resolved; an error placeholder.
    ///
    /// Validation reports `false` for any symbol from which an `Error`
    /// resolution is reachable, which is how processors detect symbols
    /// whose dependencies have not been generated yet.
    Error,
}

impl TypeResolution {
    /// Returns `true` if this resolution is the error placeholder.
    pub fn is_error(self) -> bool {
        matches!(self, TypeResolution::Error)
    }
}

/// The kind tag of a [`SymbolNode`], carrying kind-specific payload.
///
/// The node hierarchy is a tagged union rather than a trait-object
/// hierarchy so traversals can use exhaustive `match` dispatch.
#[derive(Clone, Debug)]
pub enum SymbolKind {
    /// A source file. Children are its top-level declarations.
    File {
        /// Path of the file, as supplied by the build driver.
        path: PathBuf,
        /// The package all top-level declarations in this file live in.
        package: Ident,
    },
    /// A class-like declaration. Children are type parameters, supertype
    /// references, annotations, and member declarations.
    Class {
        /// The flavor of this class.
        kind: ClassKind,
    },
    /// A function. Children are annotations, type parameters, value
    /// parameters, the return type reference, and local declarations.
    Function,
    /// A property. Children are annotations and its type reference.
    Property,
    /// A value parameter. Children hold its type reference.
    Parameter,
    /// A type parameter. Children are its bound references.
    TypeParameter,
    /// A reference to a type. Children are its type arguments.
    TypeReference {
        /// What the reference resolved to.
        resolution: TypeResolution,
    },
    /// An annotation applied to a declaration. The node's name is the
    /// annotation's fully qualified name; children are argument references.
    Annotation,
}

/// A single node in the symbol tree.
///
/// Nodes own their children; the parent link is a non-owning back-reference
/// used for qualified-name derivation and containing-file lookup.
#[derive(Debug)]
pub struct SymbolNode {
    /// The kind tag with kind-specific payload.
    pub kind: SymbolKind,
    /// The simple name of the node.
    pub name: Ident,
    /// Declaration modifiers, in source order.
    pub modifiers: Vec<Modifier>,
    /// Ordered child nodes.
    pub children: Vec<NodeId>,
    /// The parent node, if any. A lookup relation, never an ownership edge.
    pub parent: Option<NodeId>,
    /// Memoized qualified name, computed once per session.
    pub(crate) qualified_name: OnceCell<Option<Ident>>,
}

impl SymbolNode {
    /// Creates a node with no modifiers, children, or parent.
    pub fn new(kind: SymbolKind, name: Ident) -> Self {
        Self {
            kind,
            name,
            modifiers: Vec::new(),
            children: Vec::new(),
            parent: None,
            qualified_name: OnceCell::new(),
        }
    }

    /// Returns `true` if this node carries the [`Modifier::Private`] modifier.
    pub fn is_private(&self) -> bool {
        self.modifiers.contains(&Modifier::Private)
    }

    /// Returns `true` if this node is a declaration (file member), as
    /// opposed to a structural node such as a parameter or type reference.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self.kind,
            SymbolKind::Class { .. } | SymbolKind::Function | SymbolKind::Property
        )
    }
}
