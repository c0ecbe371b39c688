//! Error types for media extraction passes.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a processing pass or by pipeline loading.
///
/// Naming problems never show up here: an unrecoverable file identifier falls
/// back to sentinel values instead of failing the pass.
#[derive(Debug, Error)]
pub enum Error {
    /// The CSS grammar could not be loaded into the parser
    #[error("failed to set stylesheet parser language: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    /// The parser gave up without producing a tree
    #[error("failed to parse stylesheet")]
    Parse,

    #[error("failed to read pipeline config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid pipeline config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A downstream plugin name has no factory in the registry
    #[error("pipeline plugin `{0}` is not registered")]
    UnknownPlugin(String),

    /// A downstream plugin failed to build or to transform a fragment
    #[error("pipeline plugin `{name}` failed on {path}: {error}")]
    Plugin {
        name: String,
        path: PathBuf,
        error: anyhow::Error,
    },

    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
