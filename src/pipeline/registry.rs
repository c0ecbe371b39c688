// Plugin Registry - Name → factory table for downstream transforms
//
// Plugins cannot be loaded by name at runtime, so the host registers a
// factory for every name its pipeline config may mention.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A downstream transform applied to each extracted fragment
pub trait Transform: Send + Sync {
    /// Transform `css`, destined for `path`, into new stylesheet text
    fn transform(&self, css: &str, path: &Path) -> anyhow::Result<String>;
}

impl<F> Transform for F
where
    F: Fn(&str, &Path) -> anyhow::Result<String> + Send + Sync,
{
    fn transform(&self, css: &str, path: &Path) -> anyhow::Result<String> {
        self(css, path)
    }
}

/// Builds a transform from the options configured for its name
pub type PluginFactory = Arc<dyn Fn(&Value) -> anyhow::Result<Box<dyn Transform>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct PluginRegistry {
    factories: HashMap<String, PluginFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous entry
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Value) -> anyhow::Result<Box<dyn Transform>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Box<dyn Transform>> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PluginFactory> {
        self.factories.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}
