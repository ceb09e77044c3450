//! Build-to-build orchestration of the lookup maps.

use crate::error::CacheError;
use crate::maps::{FileToFilesMap, FileToSymbolsMap, LookupSymbol};
use crate::propagate::DirtinessPropagator;
use crate::store::LookupStore;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// The driver-supplied list of files that changed since the last build.
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    /// Files whose content changed or that were newly added.
    pub modified: Vec<PathBuf>,
    /// Files that no longer exist.
    pub removed: Vec<PathBuf>,
}

impl ChangeSet {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Tracks lookups for the current build and replays the previous build's
/// maps to decide what is dirty.
///
/// One context lives for exactly one compilation. The lifecycle is:
/// [`calc_dirty_files`](Self::calc_dirty_files), then
/// [`delete_stale_outputs`](Self::delete_stale_outputs), then the
/// `record_*` calls during processing, then
/// [`update_caches_and_outputs`](Self::update_caches_and_outputs) once the
/// build finishes successfully. Aborted builds skip the final step, so the
/// on-disk store keeps describing the last good build.
pub struct IncrementalContext {
    caches_dir: PathBuf,
    incremental: bool,
    log_dir: Option<PathBuf>,
    tool_version: String,
    /// Virtual source standing for "any change at all"; outputs of
    /// aggregating processors are justified by it.
    wildcard: PathBuf,
    /// The maps persisted by the previous successful build.
    store: LookupStore,
    rebuild: bool,
    /// Full propagation closure, wildcard and output paths included.
    dirty_closure: BTreeSet<PathBuf>,
    /// The closure restricted to sources present in this build.
    dirty_sources: BTreeSet<PathBuf>,
    removed: BTreeSet<PathBuf>,
    new_depends_on: FileToFilesMap,
    new_references: FileToSymbolsMap,
    new_defines: FileToSymbolsMap,
}

impl IncrementalContext {
    /// Opens the caches under `caches_dir`.
    ///
    /// With `incremental` off the previous store is discarded and its
    /// marker invalidated, so a later incremental build cannot trust maps
    /// that skipped this one. A missing or corrupt store degrades to a
    /// full rebuild.
    pub fn new(
        caches_dir: PathBuf,
        incremental: bool,
        incremental_log: bool,
        tool_version: &str,
        wildcard: PathBuf,
    ) -> Self {
        let store = if incremental {
            LookupStore::load(&caches_dir, tool_version)
        } else {
            let _ = LookupStore::invalidate(&caches_dir);
            None
        };
        let rebuild = store.is_none();
        let log_dir = incremental_log.then(|| caches_dir.join("logs"));
        Self {
            caches_dir,
            incremental,
            log_dir,
            tool_version: tool_version.to_string(),
            wildcard,
            store: store.unwrap_or_default(),
            rebuild,
            dirty_closure: BTreeSet::new(),
            dirty_sources: BTreeSet::new(),
            removed: BTreeSet::new(),
            new_depends_on: FileToFilesMap::new(),
            new_references: FileToSymbolsMap::new(),
            new_defines: FileToSymbolsMap::new(),
        }
    }

    /// Returns `true` if this build reprocesses everything.
    pub fn is_rebuild(&self) -> bool {
        self.rebuild
    }

    /// Computes which of `all_files` must be reprocessed this build.
    ///
    /// On a rebuild that is every file. Otherwise the change set is
    /// propagated through the persisted maps; the wildcard source is
    /// seeded whenever anything changed at all, which dirties every
    /// aggregating output.
    pub fn calc_dirty_files(
        &mut self,
        all_files: &[PathBuf],
        changes: &ChangeSet,
    ) -> BTreeSet<PathBuf> {
        self.removed = changes.removed.iter().cloned().collect();

        if self.rebuild {
            self.dirty_sources = all_files.iter().cloned().collect();
            self.dirty_closure = self.dirty_sources.clone();
            self.log_lines("dirty-set.log", std::iter::once("full rebuild".to_string()));
            return self.dirty_sources.clone();
        }

        let mut seeds: Vec<PathBuf> = changes.modified.clone();
        seeds.extend(changes.removed.iter().cloned());
        if !changes.is_empty() {
            seeds.push(self.wildcard.clone());
        }

        self.dirty_closure = DirtinessPropagator::new(&self.store).propagate(seeds);
        let current: BTreeSet<&Path> = all_files.iter().map(PathBuf::as_path).collect();
        self.dirty_sources = self
            .dirty_closure
            .iter()
            .filter(|f| current.contains(f.as_path()))
            .cloned()
            .collect();

        self.log_lines(
            "dirty-set.log",
            self.dirty_sources.iter().map(|f| f.display().to_string()),
        );
        self.dirty_sources.clone()
    }

    /// Deletes generated outputs justified by dirty or removed sources.
    ///
    /// Runs before processing so that a processor failing to regenerate an
    /// output leaves the project without it, never with a stale copy.
    pub fn delete_stale_outputs(&self) -> Result<(), CacheError> {
        let mut stale: BTreeSet<&Path> = BTreeSet::new();
        for source in self.dirty_closure.iter().chain(self.removed.iter()) {
            if let Some(outputs) = self.store.source_to_outputs.get(source) {
                stale.extend(outputs.iter().map(PathBuf::as_path));
            }
        }
        for output in stale {
            match std::fs::remove_file(output) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::Io {
                        path: output.to_path_buf(),
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    /// Records the symbols `file` defines, replacing any previous record
    /// for it this build.
    pub fn record_defined_symbols(
        &mut self,
        file: &Path,
        symbols: impl IntoIterator<Item = LookupSymbol>,
    ) {
        self.new_defines.set(file.to_path_buf(), symbols.into_iter().collect());
    }

    /// Records that processing `file` depended on `other`'s structure.
    pub fn record_file_dependency(&mut self, file: &Path, other: PathBuf) {
        self.new_depends_on.add(file, other);
    }

    /// Records that processing `file` looked up `symbol`.
    pub fn record_symbol_reference(&mut self, file: &Path, symbol: LookupSymbol) {
        self.new_references.add(file, symbol);
    }

    /// Merges this build's records into the store and flushes it.
    ///
    /// Only called after a successful build. `current_files` is every
    /// source present after the build, generated sources included;
    /// `generated` is the code generator's source-to-outputs table. Old
    /// entries survive only for clean files that still exist; dirty files
    /// get exactly what was recorded this build.
    pub fn update_caches_and_outputs(
        &mut self,
        current_files: &[PathBuf],
        generated: &BTreeMap<PathBuf, BTreeSet<PathBuf>>,
    ) -> Result<(), CacheError> {
        let current: BTreeSet<&Path> = current_files.iter().map(PathBuf::as_path).collect();

        self.store
            .source_to_outputs
            .retain_keys(|f| current.contains(f) && !self.dirty_closure.contains(f));
        for (source, outputs) in generated {
            self.store.source_to_outputs.set(source.clone(), outputs.clone());
        }

        // Generated files that are still justified keep their lookup
        // entries even when this build did not regenerate them.
        let mut live: BTreeSet<&Path> = current;
        for (_, outputs) in self.store.source_to_outputs.iter() {
            live.extend(outputs.iter().map(PathBuf::as_path));
        }
        self.store.depends_on.retain_keys(|f| live.contains(f));
        self.store.references.retain_keys(|f| live.contains(f));
        self.store.defines.retain_keys(|f| live.contains(f));

        for file in &self.dirty_sources {
            if !self.new_depends_on.contains_key(file) {
                self.store.depends_on.remove(file);
            }
            if !self.new_references.contains_key(file) {
                self.store.references.remove(file);
            }
            if !self.new_defines.contains_key(file) {
                self.store.defines.remove(file);
            }
        }
        for (file, deps) in self.new_depends_on.iter() {
            self.store.depends_on.set(file.clone(), deps.clone());
        }
        for (file, symbols) in self.new_references.iter() {
            self.store.references.set(file.clone(), symbols.clone());
        }
        for (file, symbols) in self.new_defines.iter() {
            self.store.defines.set(file.clone(), symbols.clone());
        }

        self.log_lines(
            "lookups.log",
            [
                format!("depends_on entries: {}", self.store.depends_on.len()),
                format!("references entries: {}", self.store.references.len()),
                format!("defines entries: {}", self.store.defines.len()),
                format!(
                    "source_to_outputs entries: {}",
                    self.store.source_to_outputs.len()
                ),
            ],
        );

        if self.incremental {
            self.store.save(&self.caches_dir, &self.tool_version)?;
        }
        Ok(())
    }

    /// Best-effort incremental log, one file per build phase.
    fn log_lines(&self, name: &str, lines: impl IntoIterator<Item = String>) {
        let Some(dir) = &self.log_dir else {
            return;
        };
        if std::fs::create_dir_all(dir).is_err() {
            return;
        }
        let body: String = lines.into_iter().map(|l| l + "\n").collect();
        let _ = std::fs::write(dir.join(name), body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VERSION: &str = "0.1.0-test";

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    fn wildcard() -> PathBuf {
        PathBuf::from("<any changes are relevant>")
    }

    fn context(dir: &TempDir) -> IncrementalContext {
        IncrementalContext::new(dir.path().to_path_buf(), true, false, VERSION, wildcard())
    }

    #[test]
    fn first_build_is_full_rebuild() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert!(ctx.is_rebuild());
        let dirty = ctx.calc_dirty_files(&[p("a.kt"), p("b.kt")], &ChangeSet::new());
        assert_eq!(dirty, [p("a.kt"), p("b.kt")].into_iter().collect());
    }

    #[test]
    fn non_incremental_never_loads_and_never_saves() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        ctx.calc_dirty_files(&[p("a.kt")], &ChangeSet::new());
        ctx.update_caches_and_outputs(&[p("a.kt")], &BTreeMap::new())
            .unwrap();

        let ctx = IncrementalContext::new(dir.path().to_path_buf(), false, false, VERSION, wildcard());
        assert!(ctx.is_rebuild());
        // The marker is gone, so a later incremental build rebuilds too.
        let ctx = context(&dir);
        assert!(ctx.is_rebuild());
    }

    #[test]
    fn second_build_reprocesses_only_the_closure() {
        let dir = TempDir::new().unwrap();
        let files = [p("foo.kt"), p("bar.kt"), p("baz.kt")];

        let mut ctx = context(&dir);
        ctx.calc_dirty_files(&files, &ChangeSet::new());
        ctx.record_defined_symbols(Path::new("foo.kt"), [LookupSymbol::new("Foo", "pkg")]);
        ctx.record_symbol_reference(Path::new("bar.kt"), LookupSymbol::new("Foo", "pkg"));
        ctx.update_caches_and_outputs(&files, &BTreeMap::new()).unwrap();

        let mut ctx = context(&dir);
        assert!(!ctx.is_rebuild());
        let changes = ChangeSet {
            modified: vec![p("foo.kt")],
            removed: vec![],
        };
        let dirty = ctx.calc_dirty_files(&files, &changes);
        assert!(dirty.contains(Path::new("foo.kt")));
        assert!(dirty.contains(Path::new("bar.kt")));
        assert!(!dirty.contains(Path::new("baz.kt")));
    }

    #[test]
    fn no_changes_means_nothing_dirty() {
        let dir = TempDir::new().unwrap();
        let files = [p("a.kt")];
        let mut ctx = context(&dir);
        ctx.calc_dirty_files(&files, &ChangeSet::new());
        ctx.update_caches_and_outputs(&files, &BTreeMap::new()).unwrap();

        let mut ctx = context(&dir);
        let dirty = ctx.calc_dirty_files(&files, &ChangeSet::new());
        assert!(dirty.is_empty());
    }

    #[test]
    fn any_change_dirties_aggregating_outputs() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("manifest.txt");
        std::fs::write(&out, "v1").unwrap();

        let files = [p("a.kt"), p("b.kt")];
        let mut ctx = context(&dir);
        ctx.calc_dirty_files(&files, &ChangeSet::new());
        let mut generated = BTreeMap::new();
        generated.insert(wildcard(), [out.clone()].into_iter().collect());
        generated.insert(p("a.kt"), [out.clone()].into_iter().collect());
        ctx.update_caches_and_outputs(&files, &generated).unwrap();

        // b.kt has no edge to the output, but the wildcard does.
        let mut ctx = context(&dir);
        let changes = ChangeSet {
            modified: vec![p("b.kt")],
            removed: vec![],
        };
        let dirty = ctx.calc_dirty_files(&files, &changes);
        // a.kt justifies the output, so regenerating it needs a.kt.
        assert!(dirty.contains(Path::new("a.kt")));
        ctx.delete_stale_outputs().unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn removed_files_are_pruned_and_their_outputs_deleted() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("AGen.kt");
        std::fs::write(&out, "generated").unwrap();

        let mut ctx = context(&dir);
        ctx.calc_dirty_files(&[p("a.kt")], &ChangeSet::new());
        ctx.record_defined_symbols(Path::new("a.kt"), [LookupSymbol::new("A", "pkg")]);
        let mut generated = BTreeMap::new();
        generated.insert(p("a.kt"), [out.clone()].into_iter().collect());
        ctx.update_caches_and_outputs(&[p("a.kt")], &generated).unwrap();

        let mut ctx = context(&dir);
        let changes = ChangeSet {
            modified: vec![],
            removed: vec![p("a.kt")],
        };
        let dirty = ctx.calc_dirty_files(&[], &changes);
        assert!(dirty.is_empty());
        ctx.delete_stale_outputs().unwrap();
        assert!(!out.exists());
        ctx.update_caches_and_outputs(&[], &BTreeMap::new()).unwrap();

        let ctx = context(&dir);
        assert!(!ctx.store.defines.contains_key(Path::new("a.kt")));
        assert!(!ctx.store.source_to_outputs.contains_key(Path::new("a.kt")));
    }

    #[test]
    fn stale_output_delete_tolerates_missing_files() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        ctx.calc_dirty_files(&[p("a.kt")], &ChangeSet::new());
        let mut generated = BTreeMap::new();
        generated.insert(
            p("a.kt"),
            [dir.path().join("never-written.kt")].into_iter().collect(),
        );
        ctx.update_caches_and_outputs(&[p("a.kt")], &generated).unwrap();

        let mut ctx = context(&dir);
        let changes = ChangeSet {
            modified: vec![p("a.kt")],
            removed: vec![],
        };
        ctx.calc_dirty_files(&[p("a.kt")], &changes);
        ctx.delete_stale_outputs().unwrap();
    }

    #[test]
    fn incremental_log_written_when_enabled() {
        let dir = TempDir::new().unwrap();
        let mut ctx =
            IncrementalContext::new(dir.path().to_path_buf(), true, true, VERSION, wildcard());
        ctx.calc_dirty_files(&[p("a.kt")], &ChangeSet::new());
        assert!(dir.path().join("logs").join("dirty-set.log").exists());
    }
}
