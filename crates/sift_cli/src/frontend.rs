//! A filesystem frontend that scans source text for top-level
//! declarations.
//!
//! Real deployments embed the engine next to a compiler and hand it a
//! richer [`Frontend`]; the standalone driver gets by with a line scanner
//! that recognizes package headers, imports, and unindented Kotlin/Java
//! declarations. Nested declarations are deliberately ignored.

use sift_engine::{Frontend, LookupRecorder, ProcessorError};
use sift_incremental::LookupSymbol;
use sift_symbol::{ClassKind, Modifier, NodeId, NodeKey, Session, SymbolKind, SymbolNode};
use std::path::{Path, PathBuf};

/// Modifier keywords stripped before the declaration keyword.
const MODIFIER_WORDS: &[&str] = &[
    "public", "private", "protected", "internal", "abstract", "open", "sealed", "final",
    "static", "data", "inner",
];

/// Parses each source file into a file node with one child per top-level
/// declaration.
pub struct FsFrontend;

impl Frontend for FsFrontend {
    fn parse_files(
        &mut self,
        session: &mut Session,
        paths: &[PathBuf],
        recorder: &mut dyn LookupRecorder,
    ) -> Result<Vec<NodeId>, ProcessorError> {
        let mut out = Vec::new();
        for path in paths {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("reading {}: {e}", path.display()))?;
            out.push(parse_file(session, recorder, path, &text));
        }
        Ok(out)
    }
}

fn parse_file(
    session: &mut Session,
    recorder: &mut dyn LookupRecorder,
    path: &Path,
    text: &str,
) -> NodeId {
    let package = text
        .lines()
        .find_map(|l| l.trim().strip_prefix("package "))
        .map(|p| p.trim_end_matches(';').trim().to_string())
        .unwrap_or_default();
    let package_ident = session.intern(&package);
    let file_ident = session.intern(&path.display().to_string());
    let file = session.get_or_create(NodeKey::new(path.to_path_buf(), "<file>"), |_| {
        SymbolNode::new(
            SymbolKind::File {
                path: path.to_path_buf(),
                package: package_ident,
            },
            file_ident,
        )
    });

    for line in text.lines() {
        // Indented lines are members of some enclosing declaration.
        if line.starts_with([' ', '\t']) {
            continue;
        }
        let line = line.trim();
        if let Some(import) = line.strip_prefix("import ") {
            let fqn = import.trim_end_matches(';').trim();
            let (scope, name) = fqn.rsplit_once('.').unwrap_or(("", fqn));
            recorder.record_symbol_reference(path, LookupSymbol::new(name, scope));
            continue;
        }
        if let Some((kind, name, private)) = top_level_declaration(line) {
            add_declaration(session, path, file, kind, name, private);
        }
    }
    file
}

fn top_level_declaration(line: &str) -> Option<(SymbolKind, &str, bool)> {
    let mut private = false;
    let mut tokens = line.split_whitespace().peekable();
    while let Some(&token) = tokens.peek() {
        if MODIFIER_WORDS.contains(&token) {
            private |= token == "private";
            tokens.next();
        } else {
            break;
        }
    }

    let keyword = tokens.next()?;
    let kind = match keyword {
        "class" => SymbolKind::Class {
            kind: ClassKind::Class,
        },
        "interface" | "@interface" => SymbolKind::Class {
            kind: ClassKind::Interface,
        },
        "object" => SymbolKind::Class {
            kind: ClassKind::Object,
        },
        "enum" => {
            // Kotlin spells it `enum class`.
            if tokens.peek() == Some(&"class") {
                tokens.next();
            }
            SymbolKind::Class {
                kind: ClassKind::Enum,
            }
        }
        "annotation" => {
            if tokens.peek() != Some(&"class") {
                return None;
            }
            tokens.next();
            SymbolKind::Class {
                kind: ClassKind::Annotation,
            }
        }
        "fun" => SymbolKind::Function,
        "val" | "var" => SymbolKind::Property,
        _ => return None,
    };

    let raw = tokens.next()?;
    let name = raw
        .split(['(', '<', '{', ':', '=', ';'])
        .next()
        .filter(|n| !n.is_empty())?;
    Some((kind, name, private))
}

fn add_declaration(
    session: &mut Session,
    path: &Path,
    file: NodeId,
    kind: SymbolKind,
    name: &str,
    private: bool,
) {
    let name_ident = session.intern(name);
    let node = session.get_or_create(NodeKey::new(path.to_path_buf(), name), |_| {
        let mut node = SymbolNode::new(kind, name_ident);
        if private {
            node.modifiers.push(Modifier::Private);
        }
        node
    });
    // A cache hit already hangs off the file node.
    if session.node(node).parent.is_none() {
        session.add_child(file, node);
    }
}
