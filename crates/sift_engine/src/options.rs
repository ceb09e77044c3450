//! Build configuration for one engine invocation.

use sift_codegen::OutputRoots;
use sift_common::InternalError;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Rounds a build may run before the engine gives up on convergence.
pub const DEFAULT_MAX_ROUNDS: u32 = 100;

/// Everything the engine needs to know about one build.
///
/// Constructed through [`EngineOptions::builder`]; the builder validates
/// that the required paths are present so a half-configured build cannot
/// start.
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// Name of the module being processed, used in diagnostics.
    pub module_name: String,
    /// Directories scanned for source files.
    pub source_roots: Vec<PathBuf>,
    /// Classpath entries. Recorded for processors that want them; the
    /// engine itself never opens them.
    pub classpath: Vec<PathBuf>,
    /// Output roots, one per output category.
    pub output_roots: OutputRoots,
    /// Directory holding the incremental caches.
    pub caches_dir: PathBuf,
    /// Whether lookup maps are persisted and replayed across builds.
    pub incremental: bool,
    /// Whether per-build reports are written under `<caches>/logs/`.
    pub incremental_log: bool,
    /// Whether warning diagnostics count as errors.
    pub all_warnings_as_errors: bool,
    /// Round cap; exceeding it fails the build as non-convergent.
    pub max_rounds: u32,
    /// Free-form `key=value` options handed to every processor.
    pub processor_options: BTreeMap<String, String>,
    /// Files the driver reports as changed or added since the last build.
    pub modified_sources: Vec<PathBuf>,
    /// Files the driver reports as deleted since the last build.
    pub removed_sources: Vec<PathBuf>,
}

impl EngineOptions {
    /// Starts building a configuration.
    pub fn builder() -> EngineOptionsBuilder {
        EngineOptionsBuilder::default()
    }
}

/// Builder for [`EngineOptions`].
#[derive(Debug, Default)]
pub struct EngineOptionsBuilder {
    module_name: Option<String>,
    source_roots: Vec<PathBuf>,
    classpath: Vec<PathBuf>,
    output_base: Option<PathBuf>,
    class_output_dir: Option<PathBuf>,
    java_output_dir: Option<PathBuf>,
    kotlin_output_dir: Option<PathBuf>,
    resource_output_dir: Option<PathBuf>,
    caches_dir: Option<PathBuf>,
    incremental: bool,
    incremental_log: bool,
    all_warnings_as_errors: bool,
    max_rounds: Option<u32>,
    processor_options: BTreeMap<String, String>,
    modified_sources: Vec<PathBuf>,
    removed_sources: Vec<PathBuf>,
}

impl EngineOptionsBuilder {
    /// Sets the module name. Required.
    pub fn module_name(mut self, name: impl Into<String>) -> Self {
        self.module_name = Some(name.into());
        self
    }

    /// Adds a directory to scan for sources.
    pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_roots.push(root.into());
        self
    }

    /// Adds a classpath entry.
    pub fn classpath_entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.classpath.push(entry.into());
        self
    }

    /// Sets a base directory under which any output root not set
    /// explicitly is derived (`classes`, `java`, `kotlin`, `resources`).
    pub fn output_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.output_base = Some(base.into());
        self
    }

    /// Sets the class output root explicitly.
    pub fn class_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.class_output_dir = Some(dir.into());
        self
    }

    /// Sets the Java source output root explicitly.
    pub fn java_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.java_output_dir = Some(dir.into());
        self
    }

    /// Sets the Kotlin source output root explicitly.
    pub fn kotlin_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.kotlin_output_dir = Some(dir.into());
        self
    }

    /// Sets the resource output root explicitly.
    pub fn resource_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resource_output_dir = Some(dir.into());
        self
    }

    /// Sets the incremental caches directory. Required.
    pub fn caches_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.caches_dir = Some(dir.into());
        self
    }

    /// Enables or disables incremental processing.
    pub fn incremental(mut self, on: bool) -> Self {
        self.incremental = on;
        self
    }

    /// Enables or disables the incremental log.
    pub fn incremental_log(mut self, on: bool) -> Self {
        self.incremental_log = on;
        self
    }

    /// Treats warning diagnostics as errors.
    pub fn all_warnings_as_errors(mut self, on: bool) -> Self {
        self.all_warnings_as_errors = on;
        self
    }

    /// Overrides the round cap.
    pub fn max_rounds(mut self, cap: u32) -> Self {
        self.max_rounds = Some(cap);
        self
    }

    /// Adds one processor option.
    pub fn processor_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.processor_options.insert(key.into(), value.into());
        self
    }

    /// Reports a file as changed or added since the last build.
    pub fn modified_source(mut self, file: impl Into<PathBuf>) -> Self {
        self.modified_sources.push(file.into());
        self
    }

    /// Reports a file as deleted since the last build.
    pub fn removed_source(mut self, file: impl Into<PathBuf>) -> Self {
        self.removed_sources.push(file.into());
        self
    }

    /// Validates the configuration and produces [`EngineOptions`].
    pub fn build(self) -> Result<EngineOptions, InternalError> {
        let module_name = self
            .module_name
            .ok_or_else(|| InternalError::new("module name not set"))?;
        let caches_dir = self
            .caches_dir
            .ok_or_else(|| InternalError::new("caches directory not set"))?;

        let derived = self.output_base.as_deref().map(OutputRoots::under);
        let pick = |explicit: Option<PathBuf>,
                    derive: fn(&OutputRoots) -> &PathBuf,
                    what: &str|
         -> Result<PathBuf, InternalError> {
            explicit
                .or_else(|| derived.as_ref().map(|r| derive(r).clone()))
                .ok_or_else(|| InternalError::new(format!("{what} output directory not set")))
        };
        let output_roots = OutputRoots {
            class_dir: pick(self.class_output_dir, |r| &r.class_dir, "class")?,
            java_dir: pick(self.java_output_dir, |r| &r.java_dir, "java")?,
            kotlin_dir: pick(self.kotlin_output_dir, |r| &r.kotlin_dir, "kotlin")?,
            resource_dir: pick(self.resource_output_dir, |r| &r.resource_dir, "resource")?,
        };

        Ok(EngineOptions {
            module_name,
            source_roots: self.source_roots,
            classpath: self.classpath,
            output_roots,
            caches_dir,
            incremental: self.incremental,
            incremental_log: self.incremental_log,
            all_warnings_as_errors: self.all_warnings_as_errors,
            max_rounds: self.max_rounds.unwrap_or(DEFAULT_MAX_ROUNDS),
            processor_options: self.processor_options,
            modified_sources: self.modified_sources,
            removed_sources: self.removed_sources,
        })
    }
}
