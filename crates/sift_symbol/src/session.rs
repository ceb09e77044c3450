//! Per-compilation identity scope: node arena, interner, and identity cache.

use crate::node::{NodeId, SymbolKind, SymbolNode};
use sift_common::{Ident, Interner};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Stable identity of an underlying compiler declaration.
///
/// The key is the declaring file plus the declaration path within it
/// (e.g. `"com.example.Outer.Inner"`). Two frontend lookups that produce
/// equal keys are the same declaration and must map to the same node.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct NodeKey {
    /// The file the declaration lives in.
    pub file: PathBuf,
    /// The declaration path within the file.
    pub path: String,
}

impl NodeKey {
    /// Creates a key for a declaration at `path` within `file`.
    pub fn new(file: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            path: path.into(),
        }
    }
}

/// A compilation session: the arena owning all symbol nodes, the string
/// interner, and the identity cache mapping [`NodeKey`]s to node ids.
///
/// One session serves exactly one compilation. Identity is only meaningful
/// within a session; multi-module builds in one process must use one
/// session per module, and [`clear`](Self::clear) tears everything down at
/// the compilation boundary so no identity leaks into the next one.
pub struct Session {
    nodes: Vec<SymbolNode>,
    interner: Interner,
    cache: HashMap<NodeKey, NodeId>,
}

impl Session {
    /// Creates a new empty session.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            interner: Interner::new(),
            cache: HashMap::new(),
        }
    }

    /// Interns a string in this session's interner.
    pub fn intern(&self, s: &str) -> Ident {
        self.interner.get_or_intern(s)
    }

    /// Resolves an interned identifier back to its string.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.interner.resolve(ident)
    }

    /// Allocates a node without registering an identity key.
    ///
    /// Used for structural nodes (parameters, type references, annotations)
    /// that the frontend never looks up again by identity.
    pub fn alloc(&mut self, node: SymbolNode) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Returns the node for a key, creating and caching it on first access.
    ///
    /// Repeated calls with an equal key return the same id for the lifetime
    /// of the session, which is what makes id equality usable as node
    /// identity. There is no eviction; a cache miss simply constructs.
    pub fn get_or_create(
        &mut self,
        key: NodeKey,
        create: impl FnOnce(&mut Session) -> SymbolNode,
    ) -> NodeId {
        if let Some(&id) = self.cache.get(&key) {
            return id;
        }
        let node = create(self);
        let id = self.alloc(node);
        self.cache.insert(key, id);
        id
    }

    /// Looks up a previously created node by its identity key.
    pub fn lookup(&self, key: &NodeKey) -> Option<NodeId> {
        self.cache.get(key).copied()
    }

    /// Returns a reference to the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not allocated by this session.
    pub fn node(&self, id: NodeId) -> &SymbolNode {
        &self.nodes[id.as_raw() as usize]
    }

    /// Returns a mutable reference to the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was not allocated by this session.
    pub fn node_mut(&mut self, id: NodeId) -> &mut SymbolNode {
        &mut self.nodes[id.as_raw() as usize]
    }

    /// Appends a child to `parent` and sets the child's back-reference.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Returns the number of nodes in the session.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the session holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the path of the file node containing `id`, following parent
    /// back-references. Returns the node's own path if it is a file.
    pub fn containing_file(&self, id: NodeId) -> Option<&Path> {
        let mut current = Some(id);
        while let Some(cur) = current {
            let node = self.node(cur);
            if let SymbolKind::File { path, .. } = &node.kind {
                return Some(path);
            }
            current = node.parent;
        }
        None
    }

    /// Returns the qualified name of a declaration, memoized per node.
    ///
    /// Files, parameters, type parameters, type references, and annotations
    /// have no qualified name. For declarations the name is the file's
    /// package joined with the enclosing declaration names and the node's
    /// own simple name, separated by `.`.
    pub fn qualified_name(&self, id: NodeId) -> Option<Ident> {
        let node = self.node(id);
        *node.qualified_name.get_or_init(|| {
            if !node.is_declaration() {
                return None;
            }
            let mut segments = vec![self.resolve(node.name).to_string()];
            let mut current = node.parent;
            while let Some(cur) = current {
                let parent = self.node(cur);
                match &parent.kind {
                    SymbolKind::File { package, .. } => {
                        let pkg = self.resolve(*package);
                        if !pkg.is_empty() {
                            segments.push(pkg.to_string());
                        }
                        break;
                    }
                    _ => {
                        if parent.is_declaration() {
                            segments.push(self.resolve(parent.name).to_string());
                        }
                        current = parent.parent;
                    }
                }
            }
            segments.reverse();
            Some(self.intern(&segments.join(".")))
        })
    }

    /// Drops every node, cached identity, and interned string.
    ///
    /// Must be called (or the session dropped) at the end of a compilation;
    /// reusing a session across compilations would hand out stale node
    /// identities for declarations that no longer exist.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.cache.clear();
        self.interner = Interner::new();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ClassKind, SymbolKind, SymbolNode};

    fn file_node(session: &Session, path: &str, package: &str) -> SymbolNode {
        SymbolNode::new(
            SymbolKind::File {
                path: PathBuf::from(path),
                package: session.intern(package),
            },
            session.intern(path),
        )
    }

    fn class_node(session: &Session, name: &str) -> SymbolNode {
        SymbolNode::new(
            SymbolKind::Class {
                kind: ClassKind::Class,
            },
            session.intern(name),
        )
    }

    #[test]
    fn get_or_create_returns_same_id_for_equal_keys() {
        let mut session = Session::new();
        let key = NodeKey::new("src/Foo.kt", "com.example.Foo");
        let a = session.get_or_create(key.clone(), |s| {
            let node = class_node(s, "Foo");
            node
        });
        let b = session.get_or_create(key, |_| unreachable!("must hit the cache"));
        assert_eq!(a, b);
    }

    #[test]
    fn lookup_finds_cached_nodes() {
        let mut session = Session::new();
        let key = NodeKey::new("src/Foo.kt", "com.example.Foo");
        let id = session.get_or_create(key.clone(), |s| class_node(s, "Foo"));
        assert_eq!(session.lookup(&key), Some(id));
        assert_eq!(session.lookup(&NodeKey::new("src/Bar.kt", "Bar")), None);
    }

    #[test]
    fn containing_file_walks_parents() {
        let mut session = Session::new();
        let file = file_node(&session, "src/Foo.kt", "com.example");
        let file_id = session.alloc(file);
        let class = class_node(&session, "Foo");
        let class_id = session.alloc(class);
        session.add_child(file_id, class_id);
        let fun = SymbolNode::new(SymbolKind::Function, session.intern("run"));
        let fun_id = session.alloc(fun);
        session.add_child(class_id, fun_id);

        assert_eq!(
            session.containing_file(fun_id),
            Some(Path::new("src/Foo.kt"))
        );
        assert_eq!(
            session.containing_file(file_id),
            Some(Path::new("src/Foo.kt"))
        );
    }

    #[test]
    fn qualified_name_joins_package_and_parents() {
        let mut session = Session::new();
        let file = file_node(&session, "src/Foo.kt", "com.example");
        let file_id = session.alloc(file);
        let outer_id = {
            let outer = class_node(&session, "Outer");
            session.alloc(outer)
        };
        session.add_child(file_id, outer_id);
        let inner_id = {
            let inner = class_node(&session, "Inner");
            session.alloc(inner)
        };
        session.add_child(outer_id, inner_id);

        let qn = session.qualified_name(inner_id).unwrap();
        assert_eq!(session.resolve(qn), "com.example.Outer.Inner");
    }

    #[test]
    fn qualified_name_empty_package() {
        let mut session = Session::new();
        let file = file_node(&session, "Top.kt", "");
        let file_id = session.alloc(file);
        let class_id = {
            let class = class_node(&session, "Top");
            session.alloc(class)
        };
        session.add_child(file_id, class_id);

        let qn = session.qualified_name(class_id).unwrap();
        assert_eq!(session.resolve(qn), "Top");
    }

    #[test]
    fn qualified_name_memoizes() {
        let mut session = Session::new();
        let class_id = {
            let class = class_node(&session, "Loner");
            session.alloc(class)
        };
        let first = session.qualified_name(class_id);
        let second = session.qualified_name(class_id);
        assert_eq!(first, second);
    }

    #[test]
    fn structural_nodes_have_no_qualified_name() {
        let mut session = Session::new();
        let param = SymbolNode::new(SymbolKind::Parameter, session.intern("x"));
        let id = session.alloc(param);
        assert_eq!(session.qualified_name(id), None);
    }

    #[test]
    fn clear_drops_identities() {
        let mut session = Session::new();
        let key = NodeKey::new("src/Foo.kt", "Foo");
        session.get_or_create(key.clone(), |s| class_node(s, "Foo"));
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.lookup(&key), None);
    }
}
