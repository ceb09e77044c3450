//! Dependency declarations and output categories.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Why a generated output exists: the inputs that justify it.
///
/// Every output created through the generator has exactly one
/// `Dependencies` record. An *aggregating* output depends on the entire
/// current file set for invalidation purposes, even when `sources` names
/// only a few files; a non-aggregating record with no sources has no
/// persisted justification and is regenerated on every incremental build.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dependencies {
    /// Whether the output depends on the whole file set.
    pub aggregating: bool,
    /// The input files that justify the output.
    pub sources: Vec<PathBuf>,
    all_sources: bool,
}

impl Dependencies {
    /// Creates a record naming the given justifying sources.
    pub fn new(aggregating: bool, sources: Vec<PathBuf>) -> Self {
        Self {
            aggregating,
            sources,
            all_sources: false,
        }
    }

    /// The distinguished "depends on every file in the compilation" value.
    pub fn all_sources() -> Self {
        Self {
            aggregating: true,
            sources: Vec::new(),
            all_sources: true,
        }
    }

    /// Returns `true` if this is the all-sources value.
    pub fn is_all_sources(&self) -> bool {
        self.all_sources
    }
}

/// The category of a generated output, selecting its output root.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum OutputKind {
    /// Compiled class files.
    Class,
    /// Generated Java sources, fed back into compilation.
    JavaSource,
    /// Generated Kotlin sources, fed back into compilation.
    KotlinSource,
    /// Everything else: resources, metadata, service files.
    Resource,
}

impl OutputKind {
    /// Maps a file extension to its output category. Unrecognized
    /// extensions are resources.
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            "class" => OutputKind::Class,
            "java" => OutputKind::JavaSource,
            "kt" => OutputKind::KotlinSource,
            _ => OutputKind::Resource,
        }
    }

    /// Returns `true` if outputs of this kind participate in the next
    /// round as new source files.
    pub fn is_source(self) -> bool {
        matches!(self, OutputKind::JavaSource | OutputKind::KotlinSource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping() {
        assert_eq!(OutputKind::from_extension("class"), OutputKind::Class);
        assert_eq!(OutputKind::from_extension("java"), OutputKind::JavaSource);
        assert_eq!(OutputKind::from_extension("kt"), OutputKind::KotlinSource);
        assert_eq!(OutputKind::from_extension("json"), OutputKind::Resource);
        assert_eq!(OutputKind::from_extension(""), OutputKind::Resource);
    }

    #[test]
    fn source_kinds() {
        assert!(OutputKind::JavaSource.is_source());
        assert!(OutputKind::KotlinSource.is_source());
        assert!(!OutputKind::Class.is_source());
        assert!(!OutputKind::Resource.is_source());
    }

    #[test]
    fn all_sources_is_aggregating() {
        let deps = Dependencies::all_sources();
        assert!(deps.aggregating);
        assert!(deps.is_all_sources());
        assert!(deps.sources.is_empty());
    }

    #[test]
    fn named_sources() {
        let deps = Dependencies::new(false, vec![PathBuf::from("src/Foo.kt")]);
        assert!(!deps.aggregating);
        assert!(!deps.is_all_sources());
        assert_eq!(deps.sources.len(), 1);
    }
}
