//! The dependency-tracked code generator.

use crate::deps::{Dependencies, OutputKind};
use crate::error::CodegenError;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Virtual source standing for "any change to the compilation".
///
/// Aggregating outputs are justified by this wildcard in addition to their
/// named sources; the incremental context seeds it into the dirty set
/// whenever anything changed, which is what forces aggregating outputs to
/// be regenerated on every incremental build that touches any file.
pub const ANY_CHANGES_WILDCARD: &str = "<any changes are relevant>";

/// The configured output roots, one per output category.
#[derive(Clone, Debug)]
pub struct OutputRoots {
    /// Root for compiled class outputs.
    pub class_dir: PathBuf,
    /// Root for generated Java sources.
    pub java_dir: PathBuf,
    /// Root for generated Kotlin sources.
    pub kotlin_dir: PathBuf,
    /// Root for resource outputs.
    pub resource_dir: PathBuf,
}

impl OutputRoots {
    /// Returns the output root for the given category.
    pub fn base_dir_of(&self, kind: OutputKind) -> &Path {
        match kind {
            OutputKind::Class => &self.class_dir,
            OutputKind::JavaSource => &self.java_dir,
            OutputKind::KotlinSource => &self.kotlin_dir,
            OutputKind::Resource => &self.resource_dir,
        }
    }

    /// Convenience constructor placing each category under `base`.
    pub fn under(base: &Path) -> Self {
        Self {
            class_dir: base.join("classes"),
            java_dir: base.join("java"),
            kotlin_dir: base.join("kotlin"),
            resource_dir: base.join("resources"),
        }
    }
}

/// Creates output files and records which inputs justify each of them.
///
/// One generator serves one build. Every created path is remembered for
/// duplicate detection across all rounds, and the per-round list of created
/// files is drained by the scheduler via [`take_round_files`]
/// (Self::take_round_files) to compute the next round's new files.
pub struct CodeGenerator {
    roots: OutputRoots,
    all_sources: Vec<PathBuf>,
    wildcard: PathBuf,
    incremental: bool,
    created: HashSet<PathBuf>,
    outputs: Vec<(PathBuf, OutputKind)>,
    round_files: Vec<(PathBuf, OutputKind)>,
    source_to_outputs: BTreeMap<PathBuf, BTreeSet<PathBuf>>,
}

impl CodeGenerator {
    /// Creates a generator for one build.
    ///
    /// `all_sources` is the compilation's current file set, used to expand
    /// the all-sources dependency value. The justification table is only
    /// maintained when `incremental` is set.
    pub fn new(roots: OutputRoots, all_sources: Vec<PathBuf>, incremental: bool) -> Self {
        Self {
            roots,
            all_sources,
            wildcard: PathBuf::from(ANY_CHANGES_WILDCARD),
            incremental,
            created: HashSet::new(),
            outputs: Vec::new(),
            round_files: Vec::new(),
            source_to_outputs: BTreeMap::new(),
        }
    }

    /// Adds files to the known file set (sources generated in earlier
    /// rounds also justify later all-sources outputs).
    pub fn extend_sources(&mut self, files: impl IntoIterator<Item = PathBuf>) {
        self.all_sources.extend(files);
    }

    /// Computes the relative output path for `(package, name, extension)`.
    ///
    /// The same inputs always produce the same path within one build.
    pub fn path_of(&self, package: &str, name: &str, extension: &str) -> PathBuf {
        let mut path = PathBuf::new();
        for segment in package.split('.').filter(|s| !s.is_empty()) {
            path.push(segment);
        }
        if extension.is_empty() {
            path.push(name);
        } else {
            path.push(format!("{name}.{extension}"));
        }
        path
    }

    /// Creates a new output file and registers its justification.
    ///
    /// Fails with [`CodegenError::InvalidPath`] if `..` segments in the
    /// package or name would escape the output root, and with
    /// [`CodegenError::DuplicateOutput`] if the same path was already
    /// created in this build. Parent directories are created as needed;
    /// the returned handle is closed when dropped.
    pub fn create_file(
        &mut self,
        deps: &Dependencies,
        package: &str,
        name: &str,
        extension: &str,
    ) -> Result<fs::File, CodegenError> {
        let rel = self.checked_path(package, name, extension)?;
        let kind = OutputKind::from_extension(extension);
        let full = self.roots.base_dir_of(kind).join(&rel);

        if !self.created.insert(full.clone()) {
            return Err(CodegenError::DuplicateOutput { path: full });
        }
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| CodegenError::Io {
                path: full.clone(),
                source: e,
            })?;
        }
        let file = fs::File::create(&full).map_err(|e| CodegenError::Io {
            path: full.clone(),
            source: e,
        })?;

        let sources = self.justifying_sources(deps);
        self.associate_output(&sources, &full);
        self.outputs.push((full.clone(), kind));
        self.round_files.push((full, kind));
        Ok(file)
    }

    /// Retroactively records that an existing output is also justified by
    /// the given sources.
    pub fn associate(
        &mut self,
        sources: &[PathBuf],
        package: &str,
        name: &str,
        extension: &str,
    ) -> Result<(), CodegenError> {
        let rel = self.checked_path(package, name, extension)?;
        let kind = OutputKind::from_extension(extension);
        let full = self.roots.base_dir_of(kind).join(rel);
        let sources = sources.to_vec();
        self.associate_output(&sources, &full);
        Ok(())
    }

    /// All files created during this build, in creation order.
    pub fn generated_files(&self) -> impl Iterator<Item = &Path> {
        self.outputs.iter().map(|(path, _)| path.as_path())
    }

    /// Drains the files created since the previous drain, with their kinds.
    ///
    /// Called by the scheduler at the end of each round; outputs of source
    /// kinds become the next round's new files.
    pub fn take_round_files(&mut self) -> Vec<(PathBuf, OutputKind)> {
        std::mem::take(&mut self.round_files)
    }

    /// The source-to-outputs justification table accumulated this build.
    pub fn source_to_outputs(&self) -> &BTreeMap<PathBuf, BTreeSet<PathBuf>> {
        &self.source_to_outputs
    }

    fn checked_path(
        &self,
        package: &str,
        name: &str,
        extension: &str,
    ) -> Result<PathBuf, CodegenError> {
        // Traversal may be spelled with '/' or the platform separator, and
        // `..` may hide in package segments or the name.
        let mut depth: i64 = 0;
        let segments = package
            .split('.')
            .chain(name.split(['/', '\\']))
            .filter(|s| !s.is_empty());
        for segment in segments {
            match segment {
                "." => {}
                ".." => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(CodegenError::InvalidPath {
                            path: self.path_of(package, name, extension),
                        });
                    }
                }
                _ => depth += 1,
            }
        }
        Ok(self.path_of(package, name, extension))
    }

    fn justifying_sources(&self, deps: &Dependencies) -> Vec<PathBuf> {
        if deps.is_all_sources() {
            let mut sources = self.all_sources.clone();
            sources.push(self.wildcard.clone());
            sources
        } else if deps.aggregating {
            let mut sources = deps.sources.clone();
            sources.push(self.wildcard.clone());
            sources
        } else {
            deps.sources.clone()
        }
    }

    fn associate_output(&mut self, sources: &[PathBuf], output: &Path) {
        if !self.incremental {
            return;
        }
        for source in sources {
            self.source_to_outputs
                .entry(source.clone())
                .or_default()
                .insert(output.to_path_buf());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_generator(incremental: bool) -> (tempfile::TempDir, CodeGenerator) {
        let dir = tempfile::tempdir().unwrap();
        let roots = OutputRoots::under(dir.path());
        let gen = CodeGenerator::new(
            roots,
            vec![PathBuf::from("src/A.kt"), PathBuf::from("src/B.kt")],
            incremental,
        );
        (dir, gen)
    }

    #[test]
    fn path_is_reproducible_and_inside_root() {
        let (dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![PathBuf::from("src/A.kt")]);
        gen.create_file(&deps, "com.example", "FooGenerated", "kt")
            .unwrap();
        let expected = dir
            .path()
            .join("kotlin")
            .join("com/example/FooGenerated.kt");
        assert!(expected.exists());
        assert_eq!(
            gen.path_of("com.example", "FooGenerated", "kt"),
            PathBuf::from("com/example/FooGenerated.kt")
        );
    }

    #[test]
    fn kinds_map_to_their_roots() {
        let (dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        gen.create_file(&deps, "", "Thing", "java").unwrap();
        gen.create_file(&deps, "", "data", "json").unwrap();
        assert!(dir.path().join("java/Thing.java").exists());
        assert!(dir.path().join("resources/data.json").exists());
    }

    #[test]
    fn traversal_via_slash_fails() {
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        let err = gen
            .create_file(&deps, "com.example", "../../../escape", "kt")
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidPath { .. }));
    }

    #[test]
    fn package_segments_offset_leading_dotdot() {
        // `kotlin/com/example/../../escape.kt` normalizes to
        // `kotlin/escape.kt`, which is still inside the root.
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        assert!(gen
            .create_file(&deps, "com.example", "../../escape", "kt")
            .is_ok());
    }

    #[test]
    fn traversal_via_backslash_fails() {
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        let err = gen
            .create_file(&deps, "", "..\\..\\escape", "kt")
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidPath { .. }));
    }

    #[test]
    fn interior_dotdot_that_stays_inside_is_allowed() {
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        assert!(gen.create_file(&deps, "com.example", "../shifted", "kt").is_ok());
    }

    #[test]
    fn duplicate_output_fails_fast() {
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        gen.create_file(&deps, "com.example", "Foo", "kt").unwrap();
        let err = gen
            .create_file(&deps, "com.example", "Foo", "kt")
            .unwrap_err();
        assert!(matches!(err, CodegenError::DuplicateOutput { .. }));
    }

    #[test]
    fn same_name_different_kind_is_distinct() {
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        gen.create_file(&deps, "p", "Foo", "kt").unwrap();
        assert!(gen.create_file(&deps, "p", "Foo", "java").is_ok());
    }

    #[test]
    fn isolating_deps_record_only_named_sources() {
        let (dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![PathBuf::from("src/A.kt")]);
        gen.create_file(&deps, "p", "Out", "kt").unwrap();
        let table = gen.source_to_outputs();
        let outs = table.get(Path::new("src/A.kt")).unwrap();
        assert!(outs.contains(&dir.path().join("kotlin/p/Out.kt")));
        assert!(!table.contains_key(Path::new(ANY_CHANGES_WILDCARD)));
    }

    #[test]
    fn aggregating_deps_also_record_the_wildcard() {
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(true, vec![PathBuf::from("src/A.kt")]);
        gen.create_file(&deps, "p", "Agg", "kt").unwrap();
        assert!(gen
            .source_to_outputs()
            .contains_key(Path::new(ANY_CHANGES_WILDCARD)));
    }

    #[test]
    fn all_sources_records_every_file_and_the_wildcard() {
        let (_dir, mut gen) = make_generator(true);
        gen.create_file(&Dependencies::all_sources(), "p", "All", "kt")
            .unwrap();
        let table = gen.source_to_outputs();
        assert!(table.contains_key(Path::new("src/A.kt")));
        assert!(table.contains_key(Path::new("src/B.kt")));
        assert!(table.contains_key(Path::new(ANY_CHANGES_WILDCARD)));
    }

    #[test]
    fn non_incremental_skips_the_table() {
        let (_dir, mut gen) = make_generator(false);
        let deps = Dependencies::new(true, vec![PathBuf::from("src/A.kt")]);
        gen.create_file(&deps, "p", "Out", "kt").unwrap();
        assert!(gen.source_to_outputs().is_empty());
    }

    #[test]
    fn round_files_are_drained() {
        let (_dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        gen.create_file(&deps, "p", "First", "kt").unwrap();
        let round1 = gen.take_round_files();
        assert_eq!(round1.len(), 1);
        assert!(gen.take_round_files().is_empty());
        gen.create_file(&deps, "p", "Second", "kt").unwrap();
        let round2 = gen.take_round_files();
        assert_eq!(round2.len(), 1);
        // generated_files still sees both, in creation order
        assert_eq!(gen.generated_files().count(), 2);
    }

    #[test]
    fn associate_adds_justifications_retroactively() {
        let (dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![PathBuf::from("src/A.kt")]);
        gen.create_file(&deps, "p", "Out", "kt").unwrap();
        gen.associate(&[PathBuf::from("src/B.kt")], "p", "Out", "kt")
            .unwrap();
        let outs = gen
            .source_to_outputs()
            .get(Path::new("src/B.kt"))
            .unwrap();
        assert!(outs.contains(&dir.path().join("kotlin/p/Out.kt")));
    }

    #[test]
    fn written_content_is_readable() {
        let (dir, mut gen) = make_generator(true);
        let deps = Dependencies::new(false, vec![]);
        let mut file = gen.create_file(&deps, "p", "Hello", "kt").unwrap();
        writeln!(file, "class Hello").unwrap();
        drop(file);
        let content = std::fs::read_to_string(dir.path().join("kotlin/p/Hello.kt")).unwrap();
        assert_eq!(content, "class Hello\n");
    }
}
