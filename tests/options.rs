// Option behavior of full extraction passes against the sample stylesheets

use media_extract::pipeline::{PipelineFile, Transform};
use media_extract::{
    ConfigSource, Error, MediaQueryExtractor, Options, OutputName, PluginRegistry,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

const SAMPLES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/test_samples");

fn sample(name: &str) -> String {
    fs::read_to_string(Path::new(SAMPLES).join(name)).unwrap()
}

fn options_into(dir: &Path) -> Options {
    let mut options = Options::default();
    options.output.path = Some(dir.to_path_buf());
    options.stats = false;
    options.config = Some(ConfigSource::Inline(PipelineFile::default()));
    options
}

fn engine(options: Options) -> MediaQueryExtractor {
    MediaQueryExtractor::new(options, PluginRegistry::new()).unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Temp project (with marker file) holding copies of sample stylesheets
fn project_with(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    for (target, sample_name) in files {
        let path = dir.path().join(target);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, sample(sample_name)).unwrap();
    }
    dir
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// extractAll
// ---------------------------------------------------------------------------

#[test]
fn extract_all_false_only_extracts_specified_queries() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.queries.insert(
        "screen and (min-width: 999px)".to_string(),
        "specified".to_string(),
    );
    options.extract_all = false;

    let (css, report) = engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    assert_eq!(file_names(out.path()), vec!["example-specified.css"]);
    assert_eq!(report.artifacts.len(), 1);
    assert!(!css.contains("(min-width: 999px)"));
    assert!(css.contains("(min-width: 1024px)"));
}

#[test]
fn extract_all_true_extracts_every_query() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.queries.insert(
        "screen and (min-width: 999px)".to_string(),
        "specified".to_string(),
    );

    let (css, _) = engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    let names = file_names(out.path());
    assert!(names.len() > 1);
    assert!(names.contains(&"example-specified.css".to_string()));
    assert!(!css.contains("@media"));
}

#[test]
fn deprecated_whitelist_still_limits_extraction() {
    let out = tempfile::tempdir().unwrap();
    let options: Options = serde_json::from_value(json!({
        "output": { "path": path_str(out.path()) },
        "queries": { "screen and (min-width: 1200px)": "wide" },
        "whitelist": true,
        "stats": false,
        "config": { "plugins": {} }
    }))
    .unwrap();

    engine(options)
        .process_css(&sample("example.css"), Some("example.css"))
        .unwrap();

    assert_eq!(file_names(out.path()), vec!["example-wide.css"]);
}

// ---------------------------------------------------------------------------
// entry
// ---------------------------------------------------------------------------

#[test]
fn entry_overrides_the_host_file_identifier() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.entry = Some(format!("{}/entry-example.namespace.css", SAMPLES));

    engine(options)
        .process_css(&sample("entry-example.css"), Some("test_samples/example.css"))
        .unwrap();

    assert!(out.path().join("entry-example.namespace-screen.css").is_file());
}

// ---------------------------------------------------------------------------
// output
// ---------------------------------------------------------------------------

#[test]
fn no_output_path_writes_nothing_and_keeps_css() {
    let dir = tempfile::tempdir().unwrap();
    let mut options = options_into(dir.path());
    options.output.path = None;
    let input = sample("example.css");

    let (css, report) = engine(options)
        .process_css(&input, Some("test_samples/example.css"))
        .unwrap();

    assert_eq!(css, input);
    assert!(report.preview);
    assert_eq!(report.groups.len(), 3);
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn output_name_template_is_used() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.output.name = OutputName::Template("[query].[ext]".to_string());

    engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    assert!(out.path().join("screen-and-min-width-1024-px.css").is_file());
    assert!(out.path().join("screen-and-min-width-1200-px.css").is_file());
}

#[test]
fn output_name_repeated_placeholder() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.output.name = OutputName::Template("[query]-[query].[ext]".to_string());

    engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    assert!(out
        .path()
        .join("screen-and-min-width-1024-px-screen-and-min-width-1024-px.css")
        .is_file());
    assert!(out
        .path()
        .join("screen-and-min-width-1200-px-screen-and-min-width-1200-px.css")
        .is_file());
}

#[test]
fn path_placeholder_preserves_folder_structure() {
    let project = project_with(&[("test/data/name-example.css", "name-example.css")]);
    let out = project.path().join("output");
    let mut options = options_into(&out);
    options.output.name = OutputName::Template("[path]/[name]-[query].[ext]".to_string());
    let from = path_str(&project.path().join("test/data/name-example.css"));

    engine(options)
        .process_css(&sample("name-example.css"), Some(&from))
        .unwrap();

    assert!(out.join("test/data/name-example-screen.css").is_file());
}

#[test]
fn path_placeholder_relative_to_conventional_src_dir() {
    let project = project_with(&[("src/components/card.css", "name-example.css")]);
    let out = project.path().join("dist");
    let mut options = options_into(&out);
    options.output.name = OutputName::Template("[path]/[name]-[query].[ext]".to_string());
    let from = path_str(&project.path().join("src/components/card.css"));

    engine(options)
        .process_css(&sample("name-example.css"), Some(&from))
        .unwrap();

    assert!(out.join("components/card-screen.css").is_file());
}

#[test]
fn path_placeholder_empty_for_files_in_source_root() {
    let project = project_with(&[("src/main.css", "name-example.css")]);
    let out = project.path().join("dist");
    let mut options = options_into(&out);
    options.output.name = OutputName::Template("[path]/[name]-[query].[ext]".to_string());
    let from = path_str(&project.path().join("src/main.css"));

    let (_, report) = engine(options)
        .process_css(&sample("name-example.css"), Some(&from))
        .unwrap();

    assert_eq!(report.artifacts[0].display, "main-screen.css");
    assert!(out.join("main-screen.css").is_file());
}

#[test]
fn name_function_handles_identical_file_names() {
    let project = project_with(&[
        ("test/data/name-example.css", "name-example.css"),
        ("test/data/nested/name-example.css", "nested/name-example.css"),
    ]);
    let out = project.path().join("output");
    let mut options = options_into(&out);
    options.output.name = OutputName::function(|vars| {
        let path = vars.path.strip_prefix("test/").unwrap_or(vars.path);
        format!("{}/{}-{}.{}", path, vars.name, vars.query, vars.ext)
    });
    let extractor = engine(options);

    for file in ["test/data/name-example.css", "test/data/nested/name-example.css"] {
        let path = project.path().join(file);
        let css = fs::read_to_string(&path).unwrap();
        extractor.process_css(&css, Some(&path_str(&path))).unwrap();
    }

    assert!(out.join("data/name-example-screen.css").is_file());
    assert!(out.join("data/nested/name-example-screen.css").is_file());
}

#[test]
fn src_path_overrides_root_detection() {
    let project = project_with(&[("test/data/nested/name-example.css", "nested/name-example.css")]);
    let out = project.path().join("output");
    let mut options = options_into(&out);
    options.output.name = OutputName::Template("[path]/[name]-[query].[ext]".to_string());
    options.src.path = Some(project.path().join("test/data"));
    let from = path_str(&project.path().join("test/data/nested/name-example.css"));

    engine(options)
        .process_css(&sample("nested/name-example.css"), Some(&from))
        .unwrap();

    assert!(out.join("nested/name-example-screen.css").is_file());
}

#[test]
fn absolute_name_ignores_output_path() {
    let out = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    let target: PathBuf = elsewhere.path().join("abs");
    options.output.name = OutputName::function(move |vars| {
        path_str(&target.join(format!("{}.{}", vars.query, vars.ext)))
    });

    let (_, report) = engine(options)
        .process_css(&sample("name-example.css"), Some("name-example.css"))
        .unwrap();

    assert!(elsewhere.path().join("abs/screen.css").is_file());
    assert!(file_names(out.path()).is_empty());
    assert_eq!(report.artifacts[0].path, elsewhere.path().join("abs/screen.css"));
}

#[test]
fn write_failure_fails_the_pass() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, "").unwrap();
    let options = options_into(&blocker);

    let result = engine(options).process_css(&sample("example.css"), Some("example.css"));

    assert!(matches!(
        result,
        Err(Error::Write { .. }) | Err(Error::CreateDir { .. })
    ));
}

// ---------------------------------------------------------------------------
// queries
// ---------------------------------------------------------------------------

#[test]
fn query_override_exact_match() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.queries.insert(
        "screen and (min-width: 1024px)".to_string(),
        "desktop".to_string(),
    );

    engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    assert!(out.path().join("example-desktop.css").is_file());
    assert!(!out.path().join("example-screen-and-min-width-1024-px.css").exists());
}

#[test]
fn query_override_without_exact_match_is_ignored() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options
        .queries
        .insert("min-width: 1200px".to_string(), "xdesktop".to_string());

    engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    assert!(!out.path().join("example-xdesktop.css").exists());
    assert!(out.path().join("example-screen-and-min-width-1200-px.css").is_file());
}

// ---------------------------------------------------------------------------
// combine
// ---------------------------------------------------------------------------

#[test]
fn combine_merges_same_key_blocks_in_order() {
    let out = tempfile::tempdir().unwrap();
    let options = options_into(out.path());

    let (css, report) = engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    let keys: Vec<&str> = report.groups.keys().collect();
    assert_eq!(
        keys,
        vec![
            "screen-and-min-width-1024-px",
            "screen-and-min-width-1200-px",
            "screen-and-min-width-999-px",
        ]
    );
    let desktop =
        fs::read_to_string(out.path().join("example-screen-and-min-width-1024-px.css")).unwrap();
    assert_eq!(desktop.matches("@media").count(), 1);
    assert!(desktop.find("color: green").unwrap() < desktop.find("font-size: 2rem").unwrap());
    assert!(!css.contains("@media"));
    assert!(css.contains(".bar { font-size: 1rem; }"));
}

#[test]
fn no_combine_keeps_one_wrapper_per_block() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.combine = false;

    engine(options)
        .process_css(&sample("example.css"), Some("test_samples/example.css"))
        .unwrap();

    let desktop =
        fs::read_to_string(out.path().join("example-screen-and-min-width-1024-px.css")).unwrap();
    assert_eq!(
        desktop,
        "@media screen and (min-width: 1024px) {\n    .foo { color: green; }\n}\n@media screen and (min-width: 1024px) {\n    .bar { font-size: 2rem; }\n}"
    );
}

#[test]
fn repeated_runs_produce_identical_output() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    let run = |dir: &Path| {
        engine(options_into(dir))
            .process_css(&sample("example.css"), Some("example.css"))
            .unwrap()
    };
    let (css_a, report_a) = run(first.path());
    let (css_b, report_b) = run(second.path());

    assert_eq!(css_a, css_b);
    assert_eq!(report_a.groups, report_b.groups);
    assert_eq!(file_names(first.path()), file_names(second.path()));
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn counting(counter: Arc<AtomicUsize>) -> impl Fn(&Value) -> anyhow::Result<Box<dyn Transform>> {
    move |_: &Value| {
        counter.fetch_add(1, Ordering::SeqCst);
        let banner = |css: &str, _: &Path| -> anyhow::Result<String> {
            Ok(format!("/* processed */\n{}", css))
        };
        Ok(Box::new(banner) as Box<dyn Transform>)
    }
}

#[test]
fn config_applies_only_subsequent_plugins() {
    let out = tempfile::tempdir().unwrap();
    let preceding = Arc::new(AtomicUsize::new(0));
    let subsequent = Arc::new(AtomicUsize::new(0));
    let registry = PluginRegistry::new()
        .with("preceding-plugin", counting(Arc::clone(&preceding)))
        .with("subsequent-plugin", counting(Arc::clone(&subsequent)));

    let mut options = options_into(out.path());
    options.config = Some(ConfigSource::Inline(
        serde_json::from_value(json!({
            "plugins": {
                "preceding-plugin": {},
                "media-extract": {},
                "subsequent-plugin": {}
            }
        }))
        .unwrap(),
    ));
    let extractor = MediaQueryExtractor::new(options, registry).unwrap();

    extractor
        .process_css(&sample("example.css"), Some("example.css"))
        .unwrap();

    assert_eq!(preceding.load(Ordering::SeqCst), 0);
    assert!(subsequent.load(Ordering::SeqCst) >= 1);
    let written =
        fs::read_to_string(out.path().join("example-screen-and-min-width-1200-px.css")).unwrap();
    assert!(written.starts_with("/* processed */\n@media"));
}

#[test]
fn config_file_path_is_loaded() {
    let out = tempfile::tempdir().unwrap();
    let config_dir = tempfile::tempdir().unwrap();
    let config_path = config_dir.path().join("pipeline.config.json");
    fs::write(
        &config_path,
        r#"{ "plugins": { "media-extract": {}, "subsequent-plugin": {} } }"#,
    )
    .unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let registry = PluginRegistry::new().with("subsequent-plugin", counting(Arc::clone(&calls)));

    let mut options = options_into(out.path());
    options.config = Some(ConfigSource::Path(config_path));
    let extractor = MediaQueryExtractor::new(options, registry).unwrap();

    extractor
        .process_css(&sample("name-example.css"), Some("name-example.css"))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn config_with_unregistered_subsequent_plugin_is_rejected() {
    let out = tempfile::tempdir().unwrap();
    let mut options = options_into(out.path());
    options.config = Some(ConfigSource::Inline(
        serde_json::from_value(json!({ "plugins": ["media-extract", "not-registered"] })).unwrap(),
    ));

    let result = MediaQueryExtractor::new(options, PluginRegistry::new());

    assert!(matches!(result, Err(Error::UnknownPlugin(name)) if name == "not-registered"));
}
