//! Resolvability validation of symbols.
//!
//! Processors use [`validate`] to decide whether a symbol is fully
//! resolvable in the current round or should be deferred: a symbol whose
//! supertype, parameter type, bound, or annotation argument resolves to an
//! error placeholder usually depends on a file another processor has not
//! generated yet.

use crate::node::{NodeId, SymbolKind, TypeResolution};
use crate::session::Session;
use std::collections::HashSet;

/// Returns `true` if every type reference reachable from `id` resolves.
pub fn validate(session: &Session, id: NodeId) -> bool {
    validate_with(session, id, &mut |_, _| true)
}

/// Like [`validate`], with a predicate filtering which `(parent, child)`
/// edges the traversal descends; an edge the predicate rejects is treated
/// as valid without being examined.
pub fn validate_with(
    session: &Session,
    id: NodeId,
    predicate: &mut dyn FnMut(NodeId, NodeId) -> bool,
) -> bool {
    let mut visited = HashSet::new();
    validate_node(session, id, predicate, &mut visited)
}

fn validate_node(
    session: &Session,
    id: NodeId,
    predicate: &mut dyn FnMut(NodeId, NodeId) -> bool,
    visited: &mut HashSet<NodeId>,
) -> bool {
    // Nodes are revisited on recursive generic bounds (`T : Comparable<T>`);
    // a node already under examination is treated as valid to terminate.
    if !visited.insert(id) {
        return true;
    }

    let node = session.node(id);
    match node.kind {
        SymbolKind::TypeReference { resolution } => {
            if resolution.is_error() {
                return false;
            }
            if !validate_children(session, id, predicate, visited) {
                return false;
            }
            // Bounds of a referenced type parameter are part of the
            // reachable type graph.
            if let TypeResolution::Resolved(target) = resolution {
                if matches!(session.node(target).kind, SymbolKind::TypeParameter)
                    && !validate_node(session, target, predicate, visited)
                {
                    return false;
                }
            }
            true
        }
        SymbolKind::File { .. }
        | SymbolKind::Class { .. }
        | SymbolKind::Function
        | SymbolKind::Property
        | SymbolKind::Parameter
        | SymbolKind::TypeParameter
        | SymbolKind::Annotation => validate_children(session, id, predicate, visited),
    }
}

fn validate_children(
    session: &Session,
    id: NodeId,
    predicate: &mut dyn FnMut(NodeId, NodeId) -> bool,
    visited: &mut HashSet<NodeId>,
) -> bool {
    for child in session.node(id).children.clone() {
        if predicate(id, child) && !validate_node(session, child, predicate, visited) {
            return false;
        }
    }
    true
}
