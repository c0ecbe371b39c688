//! MediaQueryExtractor - Public API for one-stylesheet extraction passes
//!
//! A pass walks the stylesheet once, groups matched `@media` blocks by key,
//! then writes one file per group. Without an output directory the pass is a
//! preview: groups are reported but the tree and the filesystem are left alone.

use crate::extractors::{ExtractMode, MediaExtractor, MediaGroups, QueryClassifier};
use crate::options::Options;
use crate::output::{FileStem, OutputWriter, WrittenArtifact};
use crate::pipeline::{ConfigSource, Pipeline, PluginRegistry};
use crate::stylesheet::Stylesheet;
use crate::utils::paths::{find_project_root, relative_path_segment, resolve_source_dir};
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Outcome of one pass
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub groups: MediaGroups,
    /// Files written, in group order; empty in preview mode
    pub artifacts: Vec<WrittenArtifact>,
    /// No output path was configured: nothing removed, nothing written
    pub preview: bool,
}

pub struct MediaQueryExtractor {
    options: Options,
    pipeline: Arc<Pipeline>,
}

impl MediaQueryExtractor {
    /// Build an extractor and load its pipeline from `options.config`
    pub fn new(options: Options, registry: PluginRegistry) -> Result<Self> {
        let options = options.normalized();
        let pipeline = Pipeline::load(registry, options.config.as_ref())?;
        Ok(Self {
            options,
            pipeline: Arc::new(pipeline),
        })
    }

    /// Build an extractor around an already-loaded pipeline
    ///
    /// `options.config` is ignored; the pipeline is shared as-is.
    pub fn with_pipeline(options: Options, pipeline: Arc<Pipeline>) -> Self {
        Self {
            options: options.normalized(),
            pipeline,
        }
    }

    /// Re-read the pipeline configuration, keeping the plugin registry
    pub fn refresh(&mut self, source: Option<ConfigSource>) -> Result<()> {
        let pipeline = self.pipeline.reload(source.as_ref())?;
        self.pipeline = Arc::new(pipeline);
        self.options.config = source;
        Ok(())
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Run one pass over `sheet`
    ///
    /// `from` identifies the source file (absolute or relative); the `entry`
    /// option takes precedence over it. Returns after every output file has
    /// been written, or with the first failure.
    pub fn process(&self, sheet: &mut Stylesheet, from: Option<&str>) -> Result<PassReport> {
        let from = self
            .options
            .entry
            .as_deref()
            .or(from)
            .unwrap_or_default();
        let stem = FileStem::from_identifier(from);

        let classifier = QueryClassifier::new(&self.options.queries, self.options.extract_all);
        let mode = if self.options.output.path.is_some() {
            ExtractMode::Remove
        } else {
            ExtractMode::Preview
        };
        let groups = MediaExtractor::new(classifier, self.options.combine, mode).extract(sheet);

        let Some(output_dir) = self.options.output.path.as_deref() else {
            debug!("No output path; {} group(s) previewed for {}", groups.len(), from);
            return Ok(PassReport {
                groups,
                artifacts: Vec::new(),
                preview: true,
            });
        };
        if groups.is_empty() {
            return Ok(PassReport::default());
        }

        let path_segment = self.path_segment(from, output_dir);
        let writer = OutputWriter {
            output_dir,
            name: &self.options.output.name,
            pipeline: &self.pipeline,
            stem: &stem,
            path_segment: &path_segment,
            stats: self.options.stats,
        };
        let artifacts = writer.write_all(&groups)?;

        Ok(PassReport {
            groups,
            artifacts,
            preview: false,
        })
    }

    /// Parse `css`, run a pass, and return the remaining stylesheet text
    pub fn process_css(&self, css: &str, from: Option<&str>) -> Result<(String, PassReport)> {
        let mut sheet = Stylesheet::parse(css)?;
        let report = self.process(&mut sheet, from)?;
        Ok((sheet.to_css(), report))
    }

    /// `[path]` value for `from`
    fn path_segment(&self, from: &str, output_dir: &Path) -> String {
        let source_dir = match &self.options.src.path {
            Some(path) => Some(path.clone()),
            None => {
                let start = if from.is_empty() {
                    PathBuf::from(output_dir)
                } else {
                    match Path::new(from).parent() {
                        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                        // bare file name: it lives in the working directory
                        _ => PathBuf::from("."),
                    }
                };
                let root = find_project_root(&start);
                resolve_source_dir(root.as_deref())
            }
        };
        relative_path_segment(source_dir.as_deref(), from)
    }
}
