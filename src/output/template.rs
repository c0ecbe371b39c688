// Name Templater - Expands `output.name` into a destination path

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_NAME_TEMPLATE: &str = "[name]-[query].[ext]";

/// Used when the file identifier has no recoverable name
pub const FALLBACK_NAME: &str = "undefined";
pub const FALLBACK_EXT: &str = "css";

/// `[path]` plus at most one separator right after it
static PATH_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[path\]([/\\])?").unwrap());

/// Last path segment as `name.ext`, optionally followed by a `?query`
static FILE_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^/\\]+)\.(\w+)(?:\?.+)?$").unwrap());

/// Values available to an output name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameVars<'a> {
    /// Directory of the source file relative to the source root
    pub path: &'a str,
    pub name: &'a str,
    /// Group key
    pub query: &'a str,
    pub ext: &'a str,
}

pub type NameFn = Arc<dyn Fn(&NameVars<'_>) -> String + Send + Sync>;

/// How output file names are built
#[derive(Clone)]
pub enum OutputName {
    /// Placeholder string using `[path]`, `[name]`, `[query]` and `[ext]`
    Template(String),
    /// Callback owning the whole name, separators included
    Function(NameFn),
}

impl OutputName {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&NameVars<'_>) -> String + Send + Sync + 'static,
    {
        OutputName::Function(Arc::new(f))
    }

    /// Expand to a file name or path (relative unless the result is absolute)
    pub fn expand(&self, vars: &NameVars<'_>) -> String {
        match self {
            OutputName::Function(f) => f(vars),
            OutputName::Template(template) => expand_template(template, vars),
        }
    }
}

impl Default for OutputName {
    fn default() -> Self {
        OutputName::Template(DEFAULT_NAME_TEMPLATE.to_string())
    }
}

impl fmt::Debug for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputName::Template(template) => f.debug_tuple("Template").field(template).finish(),
            OutputName::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl<'de> Deserialize<'de> for OutputName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(OutputName::Template)
    }
}

fn expand_template(template: &str, vars: &NameVars<'_>) -> String {
    // An empty [path] also swallows its separator so the result never starts
    // with a stray "/" (which would make it absolute)
    let with_path = PATH_PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
        if vars.path.is_empty() {
            String::new()
        } else {
            let sep = caps.get(1).map_or("", |m| m.as_str());
            format!("{}{}", vars.path, sep)
        }
    });

    with_path
        .replace("[name]", vars.name)
        .replace("[query]", vars.query)
        .replace("[ext]", vars.ext)
}

/// Name and extension recovered from a file identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStem {
    pub name: String,
    pub ext: String,
}

impl FileStem {
    /// `"styles/main.min.css?v=3"` gives `main.min` / `css`; anything
    /// unrecognizable gives the fallback sentinels
    pub fn from_identifier(identifier: &str) -> Self {
        match FILE_IDENTIFIER.captures(identifier) {
            Some(caps) => Self {
                name: caps[1].to_string(),
                ext: caps[2].to_string(),
            },
            None => Self {
                name: FALLBACK_NAME.to_string(),
                ext: FALLBACK_EXT.to_string(),
            },
        }
    }
}

/// Where one group gets written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub directory: PathBuf,
    pub filename: String,
    /// The expanded name was already absolute and ignored the output directory
    pub absolute: bool,
    /// The expanded name as produced by the template, for log lines
    pub display: String,
}

impl OutputTarget {
    pub fn resolve(expanded: String, output_dir: &Path) -> Self {
        let expanded_path = Path::new(&expanded);
        let absolute = expanded_path.is_absolute();
        let full = if absolute {
            expanded_path.to_path_buf()
        } else {
            output_dir.join(expanded_path)
        };

        let filename = full
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = full
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output_dir.to_path_buf());

        Self {
            directory,
            filename,
            absolute,
            display: expanded,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }
}
