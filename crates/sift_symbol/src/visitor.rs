//! Exhaustive-match traversal over the symbol tree.

use crate::node::{NodeId, SymbolKind};
use crate::session::Session;

/// A visitor over symbol nodes.
///
/// Hooks default to no-ops; [`visit_node`](Self::visit_node) is called for
/// every node before its kind-specific hook. Traversal order and recursion
/// are owned by [`walk`], which dispatches on the kind tag exhaustively, so
/// adding a new node kind is a compile error until every walk arm handles it.
pub trait SymbolVisitor {
    /// Called for every node, before the kind-specific hook.
    fn visit_node(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for file nodes.
    fn visit_file(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for class-like declarations.
    fn visit_class(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for functions.
    fn visit_function(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for properties.
    fn visit_property(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for value parameters.
    fn visit_parameter(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for type parameters.
    fn visit_type_parameter(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for type references.
    fn visit_type_reference(&mut self, _session: &Session, _id: NodeId) {}

    /// Called for annotations.
    fn visit_annotation(&mut self, _session: &Session, _id: NodeId) {}

    /// Returns `true` if the traversal should descend into the children of
    /// `id`. The default descends everywhere.
    fn descend(&mut self, _session: &Session, _id: NodeId) -> bool {
        true
    }
}

/// Walks the tree rooted at `id` top-down, dispatching to the visitor's
/// hooks by kind.
pub fn walk(session: &Session, id: NodeId, visitor: &mut dyn SymbolVisitor) {
    visitor.visit_node(session, id);
    match session.node(id).kind {
        SymbolKind::File { .. } => visitor.visit_file(session, id),
        SymbolKind::Class { .. } => visitor.visit_class(session, id),
        SymbolKind::Function => visitor.visit_function(session, id),
        SymbolKind::Property => visitor.visit_property(session, id),
        SymbolKind::Parameter => visitor.visit_parameter(session, id),
        SymbolKind::TypeParameter => visitor.visit_type_parameter(session, id),
        SymbolKind::TypeReference { .. } => visitor.visit_type_reference(session, id),
        SymbolKind::Annotation => visitor.visit_annotation(session, id),
    }
    if visitor.descend(session, id) {
        // children is cloned so the visitor may inspect the session freely
        for child in session.node(id).children.clone() {
            walk(session, child, visitor);
        }
    }
}

/// Collects the `(name, scope)` pairs of every externally visible symbol
/// defined in the tree rooted at `root` (normally a file node).
///
/// Private declarations are skipped, and declarations local to function
/// bodies are not visible to other files so the traversal does not descend
/// into functions. The scope is the declaration's qualified name with the
/// trailing simple name removed.
pub fn collect_defined_symbols(
    session: &Session,
    root: NodeId,
    mut emit: impl FnMut(&str, &str),
) {
    struct Collector<'e> {
        emit: &'e mut dyn FnMut(&str, &str),
    }

    impl SymbolVisitor for Collector<'_> {
        fn visit_node(&mut self, session: &Session, id: NodeId) {
            let node = session.node(id);
            if !node.is_declaration() || node.is_private() {
                return;
            }
            let Some(qualified) = session.qualified_name(id) else {
                return;
            };
            let name = session.resolve(node.name);
            let qualified = session.resolve(qualified);
            let scope_len = qualified.len().saturating_sub(name.len() + 1);
            (self.emit)(name, &qualified[..scope_len]);
        }

        fn descend(&mut self, session: &Session, id: NodeId) -> bool {
            let node = session.node(id);
            // Declarations inside function bodies are local.
            if matches!(node.kind, SymbolKind::Function) {
                return false;
            }
            // Skip declarations hidden behind a private container.
            !node.is_private()
        }
    }

    walk(session, root, &mut Collector { emit: &mut emit });
}
