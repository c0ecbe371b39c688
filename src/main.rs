use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use media_extract::pipeline::SELF_NAME;
use media_extract::{
    ConfigSource, MediaQueryExtractor, Options, OutputName, Pipeline, PluginRegistry,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(
    name = "media-extract",
    about = "Split @media blocks out of stylesheets into per-query files"
)]
struct Cli {
    /// Stylesheets to process (glob patterns allowed)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Pipeline config (default: pipeline.config.json at the project root)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for extracted files
    #[arg(short, long, conflicts_with = "preview")]
    output: Option<PathBuf>,

    /// Output name template, e.g. "[path]/[name]-[query].[ext]"
    #[arg(short, long)]
    name: Option<String>,

    /// Report groups without writing anything
    #[arg(long)]
    preview: bool,

    /// Write the remaining base stylesheets into this directory
    #[arg(long)]
    residual: Option<PathBuf>,

    /// Don't log each extracted file
    #[arg(short, long)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let t0 = Instant::now();
    let source = cli.config.clone().map(ConfigSource::Path);
    let pipeline = Pipeline::load(PluginRegistry::new(), source.as_ref())
        .context("Failed to load pipeline config")?;
    let options = options_from(&cli, &pipeline)?;
    let engine = MediaQueryExtractor::with_pipeline(options, Arc::new(pipeline));

    let files = expand_inputs(&cli.inputs)?;
    if files.is_empty() {
        bail!("No stylesheets matched {:?}", cli.inputs);
    }

    let mut failures = 0;
    let mut written = 0;
    for file in &files {
        match process_file(&engine, file, cli.residual.as_deref()) {
            Ok(count) => written += count,
            Err(e) => {
                error!("{}: {:#}", file.display(), e);
                failures += 1;
            }
        }
    }

    info!(
        "Processed {} file(s), wrote {} extracted file(s) in {:.2}s",
        files.len(),
        written,
        t0.elapsed().as_secs_f64()
    );
    if failures > 0 {
        bail!("{} of {} file(s) failed", failures, files.len());
    }
    Ok(())
}

/// Options from the extractor's own entry in the pipeline config, then flags
fn options_from(cli: &Cli, pipeline: &Pipeline) -> anyhow::Result<Options> {
    let mut options: Options = match pipeline.config().options_for(SELF_NAME) {
        Some(value) if value.is_object() => serde_json::from_value(value.clone())
            .with_context(|| format!("Invalid `{}` options in pipeline config", SELF_NAME))?,
        _ => Options::default(),
    };

    if let Some(output) = &cli.output {
        options.output.path = Some(output.clone());
    }
    if cli.preview {
        options.output.path = None;
    }
    if let Some(name) = &cli.name {
        options.output.name = OutputName::Template(name.clone());
    }
    if cli.quiet {
        options.stats = false;
    }
    Ok(options)
}

fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let paths = glob::glob(pattern).with_context(|| format!("Invalid pattern {}", pattern))?;
        for path in paths {
            let path = path.with_context(|| format!("Unreadable match for {}", pattern))?;
            if path.is_file() && !files.contains(&path) {
                files.push(path);
            }
        }
    }
    Ok(files)
}

fn process_file(
    engine: &MediaQueryExtractor,
    file: &Path,
    residual: Option<&Path>,
) -> anyhow::Result<usize> {
    let css = fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let from = file.to_string_lossy();
    let (remaining, report) = engine.process_css(&css, Some(from.as_ref()))?;

    if report.preview {
        for group in &report.groups {
            let blocks = group.fragments.len();
            info!("[preview] {} `{}` ({} block(s))", group.key, group.query, blocks);
        }
    }

    if let Some(dir) = residual {
        let name = file
            .file_name()
            .with_context(|| format!("No file name in {}", file.display()))?;
        let target = dir.join(name);
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
        fs::write(&target, remaining)
            .with_context(|| format!("Failed to write {}", target.display()))?;
    }

    Ok(report.artifacts.len())
}
