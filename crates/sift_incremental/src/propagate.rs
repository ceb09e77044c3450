//! Transitive dirtiness propagation over the lookup maps.

use crate::maps::LookupSymbol;
use crate::store::LookupStore;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Computes the transitive closure of a set of dirty files.
///
/// The dependency graph has two node kinds (files and lookup symbols) and
/// three edge kinds, all of which must be followed simultaneously:
///
/// - structural: if `f` depends on a dirty file, `f` is dirty;
/// - symbol lookup: a dirty file's defined symbols dirty every file that
///   referenced them;
/// - input/output: a dirty input dirties its outputs, and a dirty output
///   must be regenerated, which requires all of its inputs to be
///   reprocessed.
///
/// Following only one edge kind under-invalidates and leaves stale
/// generated code behind.
pub struct DirtinessPropagator<'a> {
    store: &'a LookupStore,
    /// Inverted `depends_on`: file -> files depending on it.
    dependents: HashMap<&'a Path, Vec<&'a Path>>,
    /// Inverted `references`: symbol -> files that looked it up.
    referencing_files: HashMap<&'a LookupSymbol, Vec<&'a Path>>,
    /// Inverted `source_to_outputs`: output -> justifying sources.
    output_to_sources: HashMap<&'a Path, Vec<&'a Path>>,
}

enum Item {
    File(PathBuf),
    Symbol(LookupSymbol),
}

impl<'a> DirtinessPropagator<'a> {
    /// Builds the inverted indexes for one propagation run.
    pub fn new(store: &'a LookupStore) -> Self {
        let mut dependents: HashMap<&Path, Vec<&Path>> = HashMap::new();
        for (file, deps) in store.depends_on.iter() {
            for dep in deps {
                dependents.entry(dep.as_path()).or_default().push(file.as_path());
            }
        }

        let mut referencing_files: HashMap<&LookupSymbol, Vec<&Path>> = HashMap::new();
        for (file, symbols) in store.references.iter() {
            for symbol in symbols {
                referencing_files.entry(symbol).or_default().push(file.as_path());
            }
        }

        let mut output_to_sources: HashMap<&Path, Vec<&Path>> = HashMap::new();
        for (source, outputs) in store.source_to_outputs.iter() {
            for output in outputs {
                output_to_sources.entry(output.as_path()).or_default().push(source.as_path());
            }
        }

        Self {
            store,
            dependents,
            referencing_files,
            output_to_sources,
        }
    }

    /// Returns the closure of `initial` over all edge kinds.
    ///
    /// The result contains every visited file, including outputs reached
    /// through the justification table and the initial seeds themselves.
    pub fn propagate(&self, initial: impl IntoIterator<Item = PathBuf>) -> BTreeSet<PathBuf> {
        let mut visited_files: BTreeSet<PathBuf> = BTreeSet::new();
        let mut visited_symbols: HashSet<LookupSymbol> = HashSet::new();
        let mut worklist: Vec<Item> = initial.into_iter().map(Item::File).collect();

        while let Some(item) = worklist.pop() {
            match item {
                Item::File(file) => {
                    if !visited_files.insert(file.clone()) {
                        continue;
                    }
                    if let Some(dependents) = self.dependents.get(file.as_path()) {
                        for dep in dependents {
                            worklist.push(Item::File(dep.to_path_buf()));
                        }
                    }
                    if let Some(defined) = self.store.defines.get(&file) {
                        for symbol in defined {
                            worklist.push(Item::Symbol(symbol.clone()));
                        }
                    }
                    if let Some(outputs) = self.store.source_to_outputs.get(&file) {
                        for output in outputs {
                            worklist.push(Item::File(output.clone()));
                        }
                    }
                    if let Some(sources) = self.output_to_sources.get(file.as_path()) {
                        for source in sources {
                            worklist.push(Item::File(source.to_path_buf()));
                        }
                    }
                }
                Item::Symbol(symbol) => {
                    if !visited_symbols.insert(symbol.clone()) {
                        continue;
                    }
                    if let Some(files) = self.referencing_files.get(&symbol) {
                        for file in files {
                            worklist.push(Item::File(file.to_path_buf()));
                        }
                    }
                }
            }
        }

        visited_files
    }
}
