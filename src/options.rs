//! Engine options
//!
//! Mirrors the option set a build tool passes to the extractor. Options
//! deserialize from JSON with camelCase keys, typically from the extractor's
//! own entry in the pipeline config:
//!
//! ```json
//! {
//!   "output": { "path": "dist", "name": "[name]-[query].[ext]" },
//!   "queries": { "screen and (min-width: 1024px)": "desktop" },
//!   "extractAll": true
//! }
//! ```

use crate::output::OutputName;
use crate::pipeline::ConfigSource;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub output: OutputOptions,
    /// Exact-match overrides from raw media params to keys
    pub queries: HashMap<String, String>,
    /// Derive keys for media blocks without an override
    pub extract_all: bool,
    /// Log one line per written file
    pub stats: bool,
    /// Overrides the file identifier handed in by the host
    pub entry: Option<String>,
    pub src: SrcOptions,
    /// Merge same-key blocks into one wrapper instead of keeping them apart
    pub combine: bool,
    /// Pipeline configuration; the default file at the project root when absent
    pub config: Option<ConfigSource>,

    /// Deprecated: `true` meant "only extract `queries`", now `extractAll: false`
    pub whitelist: Option<bool>,
    /// Deprecated: minification belongs to a downstream plugin; ignored
    pub minimize: Option<serde_json::Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output: OutputOptions::default(),
            queries: HashMap::new(),
            extract_all: true,
            stats: true,
            entry: None,
            src: SrcOptions::default(),
            combine: true,
            config: None,
            whitelist: None,
            minimize: None,
        }
    }
}

impl Options {
    /// Apply deprecated options to their replacements, warning once per option
    pub fn normalized(mut self) -> Self {
        if let Some(whitelist) = self.whitelist.take() {
            warn!("[WARNING] whitelist option is deprecated - please use extractAll");
            if whitelist {
                self.extract_all = false;
            }
        }
        if let Some(minimize) = self.minimize.take() {
            if !matches!(minimize, serde_json::Value::Bool(false) | serde_json::Value::Null) {
                warn!("[WARNING] minimize option is deprecated - please use another plugin for this");
            }
        }
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Destination directory; `None` selects preview mode (nothing written,
    /// tree untouched)
    #[serde(deserialize_with = "deserialize_output_path")]
    pub path: Option<PathBuf>,
    pub name: OutputName,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(".")),
            name: OutputName::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct SrcOptions {
    /// Used verbatim as the `[path]` base instead of auto-detection
    pub path: Option<PathBuf>,
}

/// Accepts a path string, or `false` / `null` / `""` for preview mode
fn deserialize_output_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPath {
        Flag(bool),
        Path(String),
    }

    match Option::<RawPath>::deserialize(deserializer)? {
        Some(RawPath::Path(path)) if !path.is_empty() => Ok(Some(PathBuf::from(path))),
        Some(RawPath::Flag(true)) => Ok(Some(PathBuf::from("."))),
        _ => Ok(None),
    }
}
