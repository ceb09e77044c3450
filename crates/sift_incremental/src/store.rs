//! Persistence of the lookup maps across builds.

use crate::error::CacheError;
use crate::maps::{FileToFilesMap, FileToSymbolsMap};
use serde::{Deserialize, Serialize};
use sift_common::ContentHash;
use std::path::{Path, PathBuf};

/// File name of the serialized lookup store within the caches directory.
const LOOKUPS_FILE: &str = "lookups.bin";

/// Marker file whose presence means the persisted store matches the last
/// successful build. It is deleted before a flush begins and re-created
/// after the flush completes, so a crash mid-flush leaves no marker and the
/// next build falls back to a full rebuild.
const UPTODATE_MARKER: &str = "caches.uptodate";

/// Magic bytes identifying a sift lookup-store artifact.
const STORE_MAGIC: [u8; 4] = *b"SIFT";

/// Current store format version. Increment on breaking changes to the
/// header or payload layout.
const STORE_FORMAT_VERSION: u32 = 1;

/// Header prepended to the serialized store for validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreHeader {
    magic: [u8; 4],
    format_version: u32,
    tool_version: String,
    checksum: ContentHash,
}

/// The complete persisted state of one incremental build.
///
/// All four maps are flushed together in a single artifact: partially
/// updated lookup state is worse than none, because it silently
/// under-invalidates the next build.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupStore {
    /// File -> files it structurally depends on.
    pub depends_on: FileToFilesMap,
    /// File -> symbols it referenced during resolution.
    pub references: FileToSymbolsMap,
    /// File -> externally visible symbols it defines.
    pub defines: FileToSymbolsMap,
    /// Source file -> generated outputs it justifies.
    pub source_to_outputs: FileToFilesMap,
}

impl LookupStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the store persisted by the previous successful build.
    ///
    /// Returns `None` — a full rebuild — if the up-to-date marker is
    /// missing, the artifact is absent or corrupt, the format version
    /// changed, or it was written by a different tool version. Loading is
    /// fail-safe by design; no corruption is ever an error.
    pub fn load(caches_dir: &Path, tool_version: &str) -> Option<Self> {
        if !caches_dir.join(UPTODATE_MARKER).exists() {
            return None;
        }
        let raw = std::fs::read(caches_dir.join(LOOKUPS_FILE)).ok()?;
        if raw.len() < 4 {
            return None;
        }

        let header_len = u32::from_le_bytes(raw[..4].try_into().ok()?) as usize;
        if raw.len() < 4 + header_len {
            return None;
        }
        let header: StoreHeader =
            bincode::serde::decode_from_slice(&raw[4..4 + header_len], bincode::config::standard())
                .ok()?
                .0;
        if header.magic != STORE_MAGIC
            || header.format_version != STORE_FORMAT_VERSION
            || header.tool_version != tool_version
        {
            return None;
        }

        let payload = &raw[4 + header_len..];
        if ContentHash::from_bytes(payload) != header.checksum {
            return None;
        }
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .ok()
            .map(|(store, _)| store)
    }

    /// Flushes the store, all-or-nothing.
    ///
    /// The marker is removed first; if anything fails before it is
    /// re-created, the next build sees no marker and recomputes from
    /// scratch instead of trusting half-written state.
    pub fn save(&self, caches_dir: &Path, tool_version: &str) -> Result<(), CacheError> {
        std::fs::create_dir_all(caches_dir).map_err(|e| CacheError::Io {
            path: caches_dir.to_path_buf(),
            source: e,
        })?;
        Self::invalidate(caches_dir)?;

        let payload = bincode::serde::encode_to_vec(self, bincode::config::standard()).map_err(
            |e| CacheError::Serialization {
                reason: e.to_string(),
            },
        )?;
        let header = StoreHeader {
            magic: STORE_MAGIC,
            format_version: STORE_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
            checksum: ContentHash::from_bytes(&payload),
        };
        let header_bytes = bincode::serde::encode_to_vec(&header, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;

        // Layout: 4-byte header length (little-endian) + header + payload
        let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
        output.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        output.extend_from_slice(&header_bytes);
        output.extend_from_slice(&payload);

        let path = caches_dir.join(LOOKUPS_FILE);
        std::fs::write(&path, &output).map_err(|e| CacheError::Io { path, source: e })?;

        let marker = caches_dir.join(UPTODATE_MARKER);
        std::fs::write(&marker, b"").map_err(|e| CacheError::Io {
            path: marker,
            source: e,
        })
    }

    /// Removes the up-to-date marker so the next build rebuilds from
    /// scratch. Used when a build aborts after mutating outputs.
    pub fn invalidate(caches_dir: &Path) -> Result<(), CacheError> {
        let marker = caches_dir.join(UPTODATE_MARKER);
        match std::fs::remove_file(&marker) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io {
                path: marker,
                source: e,
            }),
        }
    }

    /// Returns the path of the serialized artifact within `caches_dir`.
    pub fn artifact_path(caches_dir: &Path) -> PathBuf {
        caches_dir.join(LOOKUPS_FILE)
    }
}
