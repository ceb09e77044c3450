//! TOML options file for the standalone driver.
//!
//! ```toml
//! processors = ["symbols-manifest"]
//!
//! [options]
//! manifest.title = "demo"
//! ```

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// The parsed contents of a `sift.toml` options file.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsFile {
    /// Processor names to run, merged with `--processor` flags.
    #[serde(default)]
    pub processors: Vec<String>,

    /// Free-form options handed to every processor, overridden by
    /// `--option` flags.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl OptionsFile {
    /// Loads and parses the file at `path`.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("reading {}: {e}", path.display()))?;
        let parsed = toml::from_str(&text)
            .map_err(|e| format!("parsing {}: {e}", path.display()))?;
        Ok(parsed)
    }
}
