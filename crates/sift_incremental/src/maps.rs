//! The persisted lookup-map types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// A `(name, scope)` pair recording a symbol reference or definition.
///
/// A file that resolved symbol `name` visible in `scope` records a lookup
/// symbol, so a later change to that symbol's definition invalidates the
/// file even when none of its structural dependency edges changed.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct LookupSymbol {
    /// The simple name of the symbol.
    pub name: String,
    /// The scope the symbol is visible in, usually its package or
    /// enclosing declaration's qualified name.
    pub scope: String,
}

impl LookupSymbol {
    /// Creates a lookup symbol.
    pub fn new(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scope: scope.into(),
        }
    }
}

impl fmt::Display for LookupSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.name)
    }
}

/// A persisted `file -> set of files` mapping.
///
/// Used both for "file depends on these files" and for "source justifies
/// these outputs". Entries for files present in the current compilation
/// are overwritten wholesale; entries for files no longer present are
/// dropped before the map is flushed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToFilesMap(BTreeMap<PathBuf, BTreeSet<PathBuf>>);

impl FileToFilesMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for `file` with the given set.
    pub fn set(&mut self, file: PathBuf, values: BTreeSet<PathBuf>) {
        self.0.insert(file, values);
    }

    /// Adds a single value to `file`'s entry, creating it if absent.
    pub fn add(&mut self, file: &Path, value: PathBuf) {
        self.0.entry(file.to_path_buf()).or_default().insert(value);
    }

    /// Returns the entry for `file`, if present.
    pub fn get(&self, file: &Path) -> Option<&BTreeSet<PathBuf>> {
        self.0.get(file)
    }

    /// Removes the entry for `file`, returning it if present.
    pub fn remove(&mut self, file: &Path) -> Option<BTreeSet<PathBuf>> {
        self.0.remove(file)
    }

    /// Returns `true` if an entry for `file` exists.
    pub fn contains_key(&self, file: &Path) -> bool {
        self.0.contains_key(file)
    }

    /// Iterates over `(file, values)` entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &BTreeSet<PathBuf>)> {
        self.0.iter()
    }

    /// Iterates over the keys in path order.
    pub fn keys(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.keys()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops entries whose key fails the predicate.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.0.retain(|k, _| keep(k));
    }
}

/// A persisted `file -> set of lookup symbols` mapping.
///
/// Used both for "file references these symbols" and for "file defines
/// these symbols".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToSymbolsMap(BTreeMap<PathBuf, BTreeSet<LookupSymbol>>);

impl FileToSymbolsMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the entry for `file` with the given set.
    pub fn set(&mut self, file: PathBuf, symbols: BTreeSet<LookupSymbol>) {
        self.0.insert(file, symbols);
    }

    /// Adds a single symbol to `file`'s entry, creating it if absent.
    pub fn add(&mut self, file: &Path, symbol: LookupSymbol) {
        self.0.entry(file.to_path_buf()).or_default().insert(symbol);
    }

    /// Returns the entry for `file`, if present.
    pub fn get(&self, file: &Path) -> Option<&BTreeSet<LookupSymbol>> {
        self.0.get(file)
    }

    /// Removes the entry for `file`, returning it if present.
    pub fn remove(&mut self, file: &Path) -> Option<BTreeSet<LookupSymbol>> {
        self.0.remove(file)
    }

    /// Returns `true` if an entry for `file` exists.
    pub fn contains_key(&self, file: &Path) -> bool {
        self.0.contains_key(file)
    }

    /// Iterates over `(file, symbols)` entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &BTreeSet<LookupSymbol>)> {
        self.0.iter()
    }

    /// Iterates over the keys in path order.
    pub fn keys(&self) -> impl Iterator<Item = &PathBuf> {
        self.0.keys()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops entries whose key fails the predicate.
    pub fn retain_keys(&mut self, mut keep: impl FnMut(&Path) -> bool) {
        self.0.retain(|k, _| keep(k));
    }
}
