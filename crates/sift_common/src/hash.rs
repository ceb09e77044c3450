//! Content hashing for change detection and cache integrity checks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

/// A 128-bit content hash computed with XXH3.
///
/// Two inputs with the same `ContentHash` are assumed identical. The driver
/// uses content hashes to decide which source files changed between builds,
/// and the lookup-store artifact uses them as payload checksums.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; 16]);

impl ContentHash {
    /// Computes the hash of a byte slice using XXH3-128.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = xxhash_rust::xxh3::xxh3_128(data);
        Self(hash.to_le_bytes())
    }

    /// Computes the hash of a file's contents.
    pub fn from_file(path: &Path) -> Result<Self, io::Error> {
        let data = std::fs::read(path)?;
        Ok(Self::from_bytes(&data))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({:02x}{:02x}..)", self.0[0], self.0[1])
    }
}
