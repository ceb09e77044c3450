//! Shared fixtures: a line-oriented text frontend and a small generating
//! processor, enough to drive the engine end to end.

use sift_codegen::Dependencies;
use sift_diagnostics::DiagnosticSink;
use sift_engine::{
    Engine, EngineOptions, Frontend, LookupRecorder, ProcessorContext, ProcessorError,
    SymbolProcessor,
};
use sift_incremental::LookupSymbol;
use sift_symbol::{ClassKind, Modifier, NodeId, NodeKey, Session, SymbolKind, SymbolNode};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Frontend over a line-oriented toy source format
// ---------------------------------------------------------------------------

/// Parses files of the form:
///
/// ```text
/// package com.example
/// import other.kt
/// ref com.example.Helper
/// class Foo @com.example.Marker
/// private class Hidden
/// ```
pub struct TextFrontend;

impl Frontend for TextFrontend {
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

            let package = text
                .lines()
                .find_map(|l| l.trim().strip_prefix("package "))
                .unwrap_or("")
                .trim()
                .to_string();
            let package_ident = session.intern(&package);
            let file_ident = session.intern(&path.display().to_string());
            let file = session.get_or_create(NodeKey::new(path.clone(), "<file>"), |_| {
                SymbolNode::new(
                    SymbolKind::File {
                        path: path.clone(),
                        package: package_ident,
                    },
                    file_ident,
                )
            });

            for line in text.lines() {
                let line = line.trim();
                if let Some(dep) = line.strip_prefix("import ") {
                    recorder.record_file_dependency(path, PathBuf::from(dep.trim()));
                } else if let Some(fqn) = line.strip_prefix("ref ") {
                    let fqn = fqn.trim();
                    let (scope, name) = fqn.rsplit_once('.').unwrap_or(("", fqn));
                    recorder.record_symbol_reference(path, LookupSymbol::new(name, scope));
                } else if line.contains("class ") {
                    parse_class(session, recorder, path, file, line);
                }
            }
            out.push(file);
        }
        Ok(out)
    }
}

fn parse_class(
    session: &mut Session,
    _recorder: &mut dyn LookupRecorder,
    path: &Path,
    file: NodeId,
    line: &str,
) {
    let private = line.starts_with("private ");
    let rest = line.trim_start_matches("private ").trim_start_matches("class ");
    let mut parts = rest.split_whitespace();
    let Some(name) = parts.next() else { return };

    let name_ident = session.intern(name);
    let class = session.get_or_create(NodeKey::new(path.to_path_buf(), name), |_| {
        let mut node = SymbolNode::new(
            SymbolKind::Class {
                kind: ClassKind::Class,
            },
            name_ident,
        );
        if private {
            node.modifiers.push(Modifier::Private);
        }
        node
    });
    // A cache hit is already attached and annotated from the earlier parse.
    if session.node(class).parent.is_some() {
        return;
    }
    session.add_child(file, class);

    for token in parts {
        if let Some(fqn) = token.strip_prefix('@') {
            let anno_ident = session.intern(fqn);
            let anno = session.alloc(SymbolNode::new(SymbolKind::Annotation, anno_ident));
            session.add_child(class, anno);
        }
    }
}

// ---------------------------------------------------------------------------
// Processors
// ---------------------------------------------------------------------------

/// Counts terminal hook invocations so tests can assert the lifecycle.
#[derive(Default)]
pub struct Hooks {
    pub finished: AtomicUsize,
    pub errored: AtomicUsize,
}

/// Generates `<Name>Generated.kt` next to each class in the round's new
/// files, one output per class, isolating dependencies.
pub struct ClassGenerator {
    pub hooks: Arc<Hooks>,
}

impl SymbolProcessor for ClassGenerator {
    fn name(&self) -> &str {
        "class-generator"
    }

    fn process(&mut self, cx: &mut ProcessorContext<'_>) -> Result<Vec<NodeId>, ProcessorError> {
        let session = cx.resolver.session();
        for &file in cx.resolver.new_files() {
            let SymbolKind::File { path, package } = &session.node(file).kind else {
                continue;
            };
            let pkg = session.resolve(*package).to_string();
            let source = path.clone();
            for &child in &session.node(file).children {
                let class = session.node(child);
                if !matches!(class.kind, SymbolKind::Class { .. }) {
                    continue;
                }
                let name = session.resolve(class.name);
                if name.ends_with("Generated") {
                    continue;
                }
                let deps = Dependencies::new(false, vec![source.clone()]);
                let mut output =
                    cx.generator
                        .create_file(&deps, &pkg, &format!("{name}Generated"), "kt")?;
                writeln!(output, "package {pkg}")?;
                writeln!(output, "class {name}Generated")?;
            }
        }
        Ok(Vec::new())
    }

    fn finish(&mut self) {
        self.hooks.finished.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn on_error(&mut self) {
        self.hooks.errored.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// Build helpers
// ---------------------------------------------------------------------------

/// Standard options for a project laid out under one temp directory.
pub fn project_options(base: &Path) -> EngineOptions {
    EngineOptions::builder()
        .module_name("test-module")
        .source_root(base.join("src"))
        .output_base(base.join("out"))
        .caches_dir(base.join("caches"))
        .incremental(true)
        .build()
        .unwrap()
}

/// Writes a source file under `<base>/src`.
pub fn write_source(base: &Path, name: &str, content: &str) -> PathBuf {
    let dir = base.join("src");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Runs one build with the given processors over the project at `base`.
pub fn run_build(
    options: EngineOptions,
    processors: Vec<Box<dyn SymbolProcessor>>,
) -> (Result<sift_engine::BuildSummary, sift_engine::EngineError>, DiagnosticSink) {
    let mut engine = Engine::new(options, Box::new(TextFrontend));
    for p in processors {
        engine.register(p);
    }
    let sink = DiagnosticSink::new();
    let result = engine.run(&sink);
    (result, sink)
}
