//! Symbol queries exposed to processors, with lookup recording.

use sift_common::Ident;
use sift_incremental::LookupSymbol;
use sift_symbol::{walk, NodeId, Session, SymbolKind, SymbolNode, SymbolVisitor};
use std::cell::RefCell;
use std::path::PathBuf;

/// The query interface a processor uses to examine the compilation.
///
/// Name-based queries are recorded so the incremental context can dirty
/// the right files when a looked-up symbol's definition changes in a
/// later build. The scheduler drains the records after each `process`
/// call.
pub struct Resolver<'a> {
    session: &'a Session,
    all_files: &'a [NodeId],
    new_files: &'a [NodeId],
    deferred: &'a [NodeId],
    lookups: RefCell<Vec<(PathBuf, LookupSymbol)>>,
}

impl<'a> Resolver<'a> {
    /// Builds the resolver for one processor invocation.
    pub fn new(
        session: &'a Session,
        all_files: &'a [NodeId],
        new_files: &'a [NodeId],
        deferred: &'a [NodeId],
    ) -> Self {
        Self {
            session,
            all_files,
            new_files,
            deferred,
            lookups: RefCell::new(Vec::new()),
        }
    }

    /// The symbol session, for direct node inspection and validation.
    pub fn session(&self) -> &'a Session {
        self.session
    }

    /// Every file in the compilation, generated sources included.
    pub fn all_files(&self) -> &'a [NodeId] {
        self.all_files
    }

    /// The files new to the current round: the dirty set in round one,
    /// the previous round's generated sources afterwards.
    pub fn new_files(&self) -> &'a [NodeId] {
        self.new_files
    }

    /// The symbols this processor deferred from the previous round.
    pub fn deferred(&self) -> &'a [NodeId] {
        self.deferred
    }

    /// Returns the declarations in this round's new files (and the
    /// deferred list) annotated with the given fully qualified name.
    pub fn symbols_with_annotation(&self, fqn: &str) -> Vec<NodeId> {
        struct Finder<'o> {
            fqn: Ident,
            out: &'o mut Vec<NodeId>,
        }

        impl SymbolVisitor for Finder<'_> {
            fn visit_node(&mut self, session: &Session, id: NodeId) {
                let node = session.node(id);
                if node.is_declaration() && has_annotation(session, node, self.fqn) {
                    self.out.push(id);
                }
            }
        }

        let fqn = self.session.intern(fqn);
        let mut out = Vec::new();
        for &file in self.new_files {
            walk(self.session, file, &mut Finder { fqn, out: &mut out });
        }
        for &id in self.deferred {
            let node = self.session.node(id);
            if node.is_declaration()
                && has_annotation(self.session, node, fqn)
                && !out.contains(&id)
            {
                out.push(id);
            }
        }
        out
    }

    /// Resolves a class-like declaration by fully qualified name.
    ///
    /// The lookup is recorded against every file of the current round:
    /// which file actually consumed the result is not observable here, so
    /// the recording over-approximates rather than miss an invalidation
    /// edge.
    pub fn class_by_name(&self, fqn: &str) -> Option<NodeId> {
        self.record_lookup(fqn);

        struct Finder {
            fqn: Ident,
            found: Option<NodeId>,
        }

        impl SymbolVisitor for Finder {
            fn visit_class(&mut self, session: &Session, id: NodeId) {
                if self.found.is_some() {
                    return;
                }
                if session.qualified_name(id) == Some(self.fqn) {
                    self.found = Some(id);
                }
            }

            fn descend(&mut self, _session: &Session, _id: NodeId) -> bool {
                self.found.is_none()
            }
        }

        let mut finder = Finder {
            fqn: self.session.intern(fqn),
            found: None,
        };
        for &file in self.all_files {
            walk(self.session, file, &mut finder);
            if finder.found.is_some() {
                break;
            }
        }
        finder.found
    }

    /// Drains the lookups recorded by name-based queries.
    pub fn take_lookups(&self) -> Vec<(PathBuf, LookupSymbol)> {
        self.lookups.take()
    }

    fn record_lookup(&self, fqn: &str) {
        let (scope, name) = match fqn.rsplit_once('.') {
            Some((scope, name)) => (scope, name),
            None => ("", fqn),
        };
        let symbol = LookupSymbol::new(name, scope);
        let mut lookups = self.lookups.borrow_mut();
        for &file in self.new_files {
            if let SymbolKind::File { path, .. } = &self.session.node(file).kind {
                lookups.push((path.clone(), symbol.clone()));
            }
        }
    }
}

fn has_annotation(session: &Session, node: &SymbolNode, fqn: Ident) -> bool {
    node.children.iter().any(|&child| {
        let child = session.node(child);
        matches!(child.kind, SymbolKind::Annotation) && child.name == fqn
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_symbol::{ClassKind, NodeKey};
    use std::path::Path;

    fn file_with_class(session: &mut Session, path: &str, pkg: &str, class: &str) -> NodeId {
        let package = session.intern(pkg);
        let file_name = session.intern(path);
        let file = session.get_or_create(NodeKey::new(path, "<file>"), |_| {
            SymbolNode::new(
                SymbolKind::File {
                    path: PathBuf::from(path),
                    package,
                },
                file_name,
            )
        });
        let class_name = session.intern(class);
        let class = session.get_or_create(NodeKey::new(path, class), |_| {
            SymbolNode::new(
                SymbolKind::Class {
                    kind: ClassKind::Class,
                },
                class_name,
            )
        });
        session.add_child(file, class);
        file
    }

    fn annotate(session: &mut Session, target: NodeId, fqn: &str) {
        let name = session.intern(fqn);
        let anno = session.alloc(SymbolNode::new(SymbolKind::Annotation, name));
        session.add_child(target, anno);
    }

    #[test]
    fn finds_annotated_declarations_in_new_files() {
        let mut session = Session::new();
        let file = file_with_class(&mut session, "a.kt", "pkg", "Foo");
        let class = session.node(file).children[0];
        annotate(&mut session, class, "pkg.Marker");
        let other = file_with_class(&mut session, "b.kt", "pkg", "Bar");

        let files = [file, other];
        let resolver = Resolver::new(&session, &files, &files, &[]);
        assert_eq!(resolver.symbols_with_annotation("pkg.Marker"), vec![class]);
        assert!(resolver.symbols_with_annotation("pkg.Other").is_empty());
    }

    #[test]
    fn deferred_symbols_are_considered_once() {
        let mut session = Session::new();
        let file = file_with_class(&mut session, "a.kt", "pkg", "Foo");
        let class = session.node(file).children[0];
        annotate(&mut session, class, "pkg.Marker");

        let files = [file];
        let deferred = [class];
        let resolver = Resolver::new(&session, &files, &files, &deferred);
        assert_eq!(resolver.symbols_with_annotation("pkg.Marker"), vec![class]);
    }

    #[test]
    fn class_lookup_resolves_and_records() {
        let mut session = Session::new();
        let file = file_with_class(&mut session, "a.kt", "pkg", "Foo");
        let class = session.node(file).children[0];

        let files = [file];
        let resolver = Resolver::new(&session, &files, &files, &[]);
        assert_eq!(resolver.class_by_name("pkg.Foo"), Some(class));
        assert_eq!(resolver.class_by_name("pkg.Missing"), None);

        let lookups = resolver.take_lookups();
        assert!(lookups.contains(&(
            PathBuf::from("a.kt"),
            LookupSymbol::new("Foo", "pkg")
        )));
        assert!(resolver.take_lookups().is_empty());
        assert_eq!(resolver.session().node(class).parent, Some(file));
        assert_eq!(
            session.containing_file(class),
            Some(Path::new("a.kt"))
        );
    }
}
