//! The round scheduler: drives processors to a fixpoint and reconciles
//! the incremental caches afterwards.

use crate::error::EngineError;
use crate::frontend::Frontend;
use crate::options::EngineOptions;
use crate::processor::{ProcessorContext, Round, SymbolProcessor};
use crate::resolver::Resolver;
use sift_codegen::{CodeGenerator, ANY_CHANGES_WILDCARD};
use sift_common::InternalError;
use sift_diagnostics::DiagnosticSink;
use sift_incremental::{ChangeSet, IncrementalContext, LookupSymbol};
use sift_symbol::{collect_defined_symbols, NodeId, Session, SymbolKind};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// What a finished build looked like.
#[derive(Debug)]
pub struct BuildSummary {
    /// Number of rounds the build ran.
    pub rounds: u32,
    /// The source files that were reprocessed.
    pub dirty_files: BTreeSet<PathBuf>,
    /// Every output created, in creation order.
    pub generated_files: Vec<PathBuf>,
}

/// One engine invocation: a frontend, a set of processors, and the
/// options describing the build.
pub struct Engine {
    options: EngineOptions,
    frontend: Box<dyn Frontend>,
    processors: Vec<Box<dyn SymbolProcessor>>,
}

impl Engine {
    /// Creates an engine with no processors registered.
    pub fn new(options: EngineOptions, frontend: Box<dyn Frontend>) -> Self {
        Self {
            options,
            frontend,
            processors: Vec::new(),
        }
    }

    /// Registers a processor. Processors run in registration order every
    /// round.
    pub fn register(&mut self, processor: Box<dyn SymbolProcessor>) {
        self.processors.push(processor);
    }

    /// Runs the build to completion.
    ///
    /// Rounds repeat while processors keep generating new source files;
    /// a round that generates none is the fixpoint. On success every
    /// processor's `finish` hook has run and the lookup maps are flushed.
    /// On failure every processor's `on_error` hook has run and the
    /// on-disk maps still describe the previous successful build.
    /// Diagnostics accumulate in `sink` either way.
    pub fn run(self, sink: &DiagnosticSink) -> Result<BuildSummary, EngineError> {
        let Engine {
            options,
            mut frontend,
            mut processors,
        } = self;

        let all_sources = scan_sources(&options.source_roots)?;
        let mut incremental = IncrementalContext::new(
            options.caches_dir.clone(),
            options.incremental,
            options.incremental_log,
            env!("CARGO_PKG_VERSION"),
            PathBuf::from(ANY_CHANGES_WILDCARD),
        );
        let changes = ChangeSet {
            modified: options.modified_sources.clone(),
            removed: options.removed_sources.clone(),
        };
        let dirty_files = incremental.calc_dirty_files(&all_sources, &changes);
        incremental.delete_stale_outputs()?;

        let mut session = Session::new();
        let file_nodes = frontend
            .parse_files(&mut session, &all_sources, &mut incremental)
            .map_err(|source| EngineError::Frontend { source })?;
        if file_nodes.len() != all_sources.len() {
            return Err(InternalError::new("frontend returned a short file list").into());
        }
        let nodes_by_path: BTreeMap<&Path, NodeId> = all_sources
            .iter()
            .map(PathBuf::as_path)
            .zip(file_nodes.iter().copied())
            .collect();

        let mut all_file_nodes = file_nodes.clone();
        let mut new_files: Vec<NodeId> = Vec::with_capacity(dirty_files.len());
        for path in &dirty_files {
            let id = nodes_by_path
                .get(path.as_path())
                .copied()
                .ok_or_else(|| InternalError::new(format!("dirty file {} was not parsed", path.display())))?;
            new_files.push(id);
        }
        // Files exposed to the symbol collector at flush time.
        let mut reprocessed_files = new_files.clone();

        let mut generator = CodeGenerator::new(
            options.output_roots.clone(),
            all_sources.clone(),
            options.incremental,
        );

        for processor in &mut processors {
            if let Err(source) = processor.init(&options.processor_options) {
                let name = processor.name().to_string();
                run_on_error(&mut processors);
                return Err(EngineError::Processor {
                    name,
                    round: 0,
                    source,
                });
            }
        }

        let mut deferred: Vec<Vec<NodeId>> = processors.iter().map(|_| Vec::new()).collect();
        let mut generated_sources: Vec<PathBuf> = Vec::new();
        let mut round = Round::FIRST;
        loop {
            if round.number() > options.max_rounds {
                run_on_error(&mut processors);
                return Err(EngineError::NonConvergence {
                    rounds: options.max_rounds,
                });
            }

            let mut failure: Option<EngineError> = None;
            for (i, processor) in processors.iter_mut().enumerate() {
                let resolver =
                    Resolver::new(&session, &all_file_nodes, &new_files, &deferred[i]);
                let mut cx = ProcessorContext {
                    resolver,
                    generator: &mut generator,
                    sink,
                    options: &options.processor_options,
                    round,
                };
                let result = processor.process(&mut cx);
                let lookups = cx.resolver.take_lookups();
                drop(cx);
                for (file, symbol) in lookups {
                    incremental.record_symbol_reference(&file, symbol);
                }
                match result {
                    Ok(next) => deferred[i] = next,
                    Err(source) => {
                        failure = Some(EngineError::Processor {
                            name: processor.name().to_string(),
                            round: round.number(),
                            source,
                        });
                        break;
                    }
                }
            }
            if let Some(error) = failure {
                run_on_error(&mut processors);
                return Err(error);
            }
            if sink.has_errors() {
                run_on_error(&mut processors);
                return Err(EngineError::ProcessorsReportedErrors {
                    count: sink.error_count(),
                });
            }

            let new_source_paths: Vec<PathBuf> = generator
                .take_round_files()
                .into_iter()
                .filter(|(_, kind)| kind.is_source())
                .map(|(path, _)| path)
                .collect();
            if new_source_paths.is_empty() {
                break;
            }

            generator.extend_sources(new_source_paths.iter().cloned());
            let parsed = frontend
                .parse_files(&mut session, &new_source_paths, &mut incremental)
                .map_err(|source| EngineError::Frontend { source })?;
            generated_sources.extend(new_source_paths);
            all_file_nodes.extend(parsed.iter().copied());
            reprocessed_files.extend(parsed.iter().copied());
            new_files = parsed;
            round = round.next();
        }

        for processor in &mut processors {
            processor.finish();
        }
        if sink.has_errors() {
            return Err(EngineError::ProcessorsReportedErrors {
                count: sink.error_count(),
            });
        }

        for &file in &reprocessed_files {
            let SymbolKind::File { path, .. } = &session.node(file).kind else {
                return Err(InternalError::new("frontend returned a non-file node").into());
            };
            let path = path.clone();
            let mut symbols = Vec::new();
            collect_defined_symbols(&session, file, |name, scope| {
                symbols.push(LookupSymbol::new(name, scope));
            });
            incremental.record_defined_symbols(&path, symbols);
        }

        let mut current_files = all_sources;
        current_files.extend(generated_sources);
        incremental.update_caches_and_outputs(&current_files, generator.source_to_outputs())?;

        Ok(BuildSummary {
            rounds: round.number(),
            dirty_files,
            generated_files: generator
                .generated_files()
                .map(Path::to_path_buf)
                .collect(),
        })
    }
}

fn run_on_error(processors: &mut [Box<dyn SymbolProcessor>]) {
    for processor in processors {
        processor.on_error();
    }
}

/// Collects the Kotlin and Java files under the source roots, sorted.
fn scan_sources(roots: &[PathBuf]) -> Result<Vec<PathBuf>, EngineError> {
    fn visit(dir: &Path, files: &mut BTreeSet<PathBuf>) -> Result<(), EngineError> {
        let entries = std::fs::read_dir(dir).map_err(|source| EngineError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| EngineError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_dir() {
                visit(&path, files)?;
            } else if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("kt" | "java")
            ) {
                files.insert(path);
            }
        }
        Ok(())
    }

    let mut files = BTreeSet::new();
    for root in roots {
        if root.is_dir() {
            visit(root, &mut files)?;
        }
    }
    Ok(files.into_iter().collect())
}
