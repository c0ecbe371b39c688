//! Downstream pipeline
//!
//! A pipeline config lists plugins in the order a build runs them, the
//! extractor itself included. Every plugin listed *after* the extractor is
//! applied to each extracted fragment before it is written, in config order.
//!
//! ```json
//! {
//!   "plugins": {
//!     "autoprefix": {},
//!     "media-extract": { "output": { "path": "dist" } },
//!     "minify": { "level": 2 }
//!   }
//! }
//! ```

mod registry;

pub use registry::{PluginFactory, PluginRegistry, Transform};

use crate::utils::paths::{absolutize, find_project_root};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name under which the extractor appears in a pipeline config
pub const SELF_NAME: &str = "media-extract";

/// Config file looked up at the project root when no source is given
pub const DEFAULT_CONFIG_FILE: &str = "pipeline.config.json";

/// Where the pipeline configuration comes from
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum ConfigSource {
    /// Config file; relative paths are resolved against the project root
    Path(PathBuf),
    /// Already-loaded configuration, used as-is
    Inline(PipelineFile),
}

/// On-disk shape of a pipeline config
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PipelineFile {
    #[serde(default)]
    pub plugins: PluginEntries,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum PluginEntries {
    /// Name → options, in config order; `false` disables a plugin
    Map(serde_json::Map<String, Value>),
    /// Names only, no options
    List(Vec<String>),
}

impl Default for PluginEntries {
    fn default() -> Self {
        PluginEntries::Map(serde_json::Map::new())
    }
}

/// Ordered plugin names with their options
#[derive(Clone, Debug, Default)]
pub struct PipelineConfig {
    names: Vec<String>,
    options: HashMap<String, Value>,
    self_name: String,
}

impl PipelineConfig {
    pub fn from_file(file: PipelineFile, self_name: &str) -> Self {
        let mut names: Vec<String> = Vec::new();
        let mut options = HashMap::new();

        match file.plugins {
            PluginEntries::Map(map) => {
                for (name, opts) in map {
                    if !options.contains_key(&name) {
                        names.push(name.clone());
                        options.insert(name, opts);
                    }
                }
            }
            PluginEntries::List(list) => {
                for name in list {
                    if !options.contains_key(&name) {
                        options.insert(name.clone(), Value::Null);
                        names.push(name);
                    }
                }
            }
        }

        Self {
            names,
            options,
            self_name: self_name.to_string(),
        }
    }

    /// Load from `source`, or from [`DEFAULT_CONFIG_FILE`] at the project root
    ///
    /// A missing file is an empty configuration, not an error.
    pub fn load(source: Option<&ConfigSource>, self_name: &str) -> Result<Self> {
        let path = match source {
            Some(ConfigSource::Inline(file)) => {
                return Ok(Self::from_file(file.clone(), self_name));
            }
            Some(ConfigSource::Path(path)) if path.is_absolute() => path.clone(),
            Some(ConfigSource::Path(path)) => project_root().join(path),
            None => project_root().join(DEFAULT_CONFIG_FILE),
        };

        if !path.is_file() {
            debug!("No pipeline config at {}; no downstream plugins", path.display());
            return Ok(Self::from_file(PipelineFile::default(), self_name));
        }

        let text = fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
            path: path.clone(),
            source,
        })?;
        let file: PipelineFile = serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.clone(),
            source,
        })?;
        debug!("Loaded pipeline config from {}", path.display());
        Ok(Self::from_file(file, self_name))
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn self_name(&self) -> &str {
        &self.self_name
    }

    /// Names listed after the extractor; empty when it is not listed at all
    pub fn downstream(&self) -> &[String] {
        match self.names.iter().position(|name| *name == self.self_name) {
            Some(pos) => &self.names[pos + 1..],
            None => &[],
        }
    }

    pub fn options_for(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }
}

fn project_root() -> PathBuf {
    let cwd = absolutize(Path::new("."));
    find_project_root(&cwd).unwrap_or(cwd)
}

#[derive(Clone, Debug)]
struct Stage {
    name: String,
    options: Value,
}

/// Loaded pipeline: configuration plus the factories for its downstream part
///
/// Read-only once built, so one instance can serve concurrent passes.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    registry: PluginRegistry,
    config: PipelineConfig,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Load the configuration and bind its downstream names to `registry`
    ///
    /// Fails with [`Error::UnknownPlugin`] if a downstream name has no factory.
    /// Names before the extractor are never looked up.
    pub fn load(registry: PluginRegistry, source: Option<&ConfigSource>) -> Result<Self> {
        let config = PipelineConfig::load(source, SELF_NAME)?;
        Self::from_config(registry, config)
    }

    pub fn from_config(registry: PluginRegistry, config: PipelineConfig) -> Result<Self> {
        let mut stages = Vec::new();
        for name in config.downstream() {
            let options = config.options_for(name).cloned().unwrap_or(Value::Null);
            if options == Value::Bool(false) {
                debug!("Pipeline plugin `{}` is disabled", name);
                continue;
            }
            if !registry.contains(name) {
                return Err(Error::UnknownPlugin(name.clone()));
            }
            stages.push(Stage {
                name: name.clone(),
                options,
            });
        }

        debug!(
            "Downstream plugins: [{}]",
            stages
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(Self {
            registry,
            config,
            stages,
        })
    }

    /// Same registry, configuration re-read from `source`
    pub fn reload(&self, source: Option<&ConfigSource>) -> Result<Self> {
        Self::load(self.registry.clone(), source)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Names of the plugins [`apply_plugins`](Self::apply_plugins) will run
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run every downstream plugin over `css` in config order
    ///
    /// Plugins are built fresh from their options for each call. With no
    /// downstream plugins the text is returned unchanged.
    pub fn apply_plugins(&self, css: &str, path: &Path) -> Result<String> {
        let mut css = css.to_string();
        for stage in &self.stages {
            let factory = self
                .registry
                .get(&stage.name)
                .ok_or_else(|| Error::UnknownPlugin(stage.name.clone()))?;
            let plugin_error = |error: anyhow::Error| Error::Plugin {
                name: stage.name.clone(),
                path: path.to_path_buf(),
                error,
            };

            let plugin = factory(&stage.options).map_err(plugin_error)?;
            css = plugin.transform(&css, path).map_err(plugin_error)?;
        }
        Ok(css)
    }
}
