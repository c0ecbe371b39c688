// Media Extract - Splits @media blocks out of stylesheets into per-query files
//
// Build-time transform: responsive rule sets move into their own files (one
// per query key) so they can be loaded conditionally, e.g. through
// `<link media="...">`, while the base stylesheet keeps everything else.

pub mod engine;
pub mod error;
pub mod extractors;
pub mod options;
pub mod output;
pub mod pipeline;
pub mod stylesheet;
pub mod utils;

pub use engine::{MediaQueryExtractor, PassReport};
pub use error::{Error, Result};
pub use extractors::{MediaGroups, QueryClassifier, QueryGroup};
pub use options::{Options, OutputOptions, SrcOptions};
pub use output::{NameVars, OutputName, OutputTarget, WrittenArtifact};
pub use pipeline::{ConfigSource, Pipeline, PipelineConfig, PluginRegistry, Transform};
pub use stylesheet::{AtRule, Node, Rule, Stylesheet};
