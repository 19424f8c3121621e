//! Build System Test Suite
//!
//! Integration tests for the sitebake build pipeline, driven through the
//! public library API with in-memory compilers standing in for the
//! external tools. Covers:
//!
//! - Directory scanning
//! - Output cleaning
//! - Per-file failure isolation for templates and stylesheets
//! - Script bundling and unresolved requires
//! - Full-pipeline idempotence and the empty-tree scenario

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use sitebake::build::{
    build_script, build_stylesheets, build_templates, clean, scan_dir, BuildConfig, BuildContext,
    BuildPipeline, Capabilities, FileStatus, RoutineKind, ScanError,
};
use sitebake::config::default_config;
use sitebake::transform::{
    BundleOptions, Bundler, ClientTemplate, ScriptCompiler, StyleOptions, StylesheetCompiler,
    TemplateCompiler, TemplateRuntime, TransformError,
};

// ============================================================================
// Test Utilities
// ============================================================================

/// Renders each `h1 <text>` / `p <text>` line; anything else is a syntax error.
struct FakeJade;

impl TemplateCompiler for FakeJade {
    fn render(&self, source: &str, file: &Path) -> Result<String, TransformError> {
        let mut html = String::new();
        for (n, line) in source.lines().enumerate() {
            let (tag, text) = line.split_once(' ').unwrap_or((line, ""));
            if tag != "h1" && tag != "p" {
                return Err(TransformError::new(format!(
                    "Error: {}:{}\nunexpected text \"{}\"",
                    file.display(),
                    n + 1,
                    line
                )));
            }
            html.push_str(&format!("<{0}>{1}</{0}>", tag, text));
        }
        Ok(html)
    }

    fn compile_client(&self, source: &str, _file: &Path) -> Result<ClientTemplate, TransformError> {
        Ok(ClientTemplate {
            function: format!("function template(locals) {{ return {:?}; }}", source),
            runtime: Some(TemplateRuntime {
                attrs: "function attrs(obj) {}".to_string(),
                escape: "function escape(html) {}".to_string(),
                rethrow: "function rethrow(err) {}".to_string(),
            }),
        })
    }
}

/// Turns `selector\n  prop value` blocks into CSS; an unbalanced `{` is a parse error.
struct FakeStylus;

impl StylesheetCompiler for FakeStylus {
    fn render(&self, source: &str, options: &StyleOptions) -> Result<String, TransformError> {
        if source.contains('{') {
            return Err(TransformError::new(format!(
                "ParseError: {}:1\nunexpected \"{{\"",
                options.filename.display()
            )));
        }
        let mut css = String::new();
        for line in source.lines() {
            match line.strip_prefix("  ") {
                Some(decl) => {
                    let (prop, value) = decl.split_once(' ').unwrap_or((decl, ""));
                    css.push_str(&format!("  {}: {};\n", prop, value));
                }
                None => {
                    if !css.is_empty() {
                        css.push_str("}\n");
                    }
                    css.push_str(&format!("{} {{\n", line));
                }
            }
        }
        if !css.is_empty() {
            css.push_str("}\n");
        }
        Ok(css)
    }
}

struct FakeCoffee;

impl ScriptCompiler for FakeCoffee {
    fn compile(&self, source: &str, _file: &Path) -> Result<String, TransformError> {
        Ok(format!("(function() {{\n  {};\n}}).call(this);", source.trim()))
    }
}

/// Resolves `require './x'` lines against the entry directory, one level deep.
struct FakeBundler;

impl Bundler for FakeBundler {
    fn bundle(&self, options: &BundleOptions) -> Result<String, TransformError> {
        let mut out = String::new();
        for (entry, alias) in &options.requires {
            let dir = Path::new(entry);
            let main = ["index.coffee", "index.js"]
                .iter()
                .map(|name| dir.join(name))
                .find(|p| p.exists())
                .ok_or_else(|| TransformError::new(format!("Cannot find entry in {}", entry)))?;
            out.push_str(&format!("// module {}\n", alias));
            out.push_str(&self.load(options, &main)?);

            let source = fs::read_to_string(&main).map_err(|e| TransformError::new(e.to_string()))?;
            for line in source.lines() {
                let Some(module) = line.trim().strip_prefix("require '").and_then(|r| r.strip_suffix('\'')) else {
                    continue;
                };
                let candidates: Vec<PathBuf> = options
                    .extensions
                    .keys()
                    .map(|ext| dir.join(format!("{}{}", module, ext)))
                    .collect();
                match candidates.into_iter().find(|p| p.exists()) {
                    Some(path) => out.push_str(&format!("\n{}", self.load(options, &path)?)),
                    None => (options.relax)(module, &main),
                }
            }
        }
        Ok(out)
    }
}

impl FakeBundler {
    fn load(&self, options: &BundleOptions, path: &Path) -> Result<String, TransformError> {
        let ext = format!(".{}", path.extension().and_then(|e| e.to_str()).unwrap_or_default());
        match options.extensions.get(&ext) {
            Some(handler) => handler(path),
            None => fs::read_to_string(path).map_err(|e| TransformError::new(e.to_string())),
        }
    }
}

fn capabilities() -> Capabilities {
    Capabilities::none()
        .with_script(Arc::new(FakeCoffee))
        .with_templates(Arc::new(FakeJade))
        .with_stylesheets(Arc::new(FakeStylus))
        .with_bundler(Arc::new(FakeBundler))
}

/// Create a project with the default layout in a temporary directory.
fn create_test_context() -> (TempDir, BuildContext) {
    let temp = TempDir::new().unwrap();
    for dir in ["scripts", "templates/jade", "styles/stylus"] {
        fs::create_dir_all(temp.path().join(dir)).unwrap();
    }
    let config = BuildConfig::resolve(&default_config(), temp.path()).unwrap();
    (temp, BuildContext::new(config, capabilities()))
}

/// Create a test file with content.
fn create_test_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

/// Every file under `dir` with its contents.
fn snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    scan_dir(dir)
        .unwrap_or_default()
        .into_iter()
        .map(|p| {
            let bytes = fs::read(&p).unwrap();
            (p, bytes)
        })
        .collect()
}

// ============================================================================
// Scanner Tests
// ============================================================================

#[test]
fn test_scan_returns_each_file_exactly_once() {
    let temp = TempDir::new().unwrap();
    let mut expected = HashSet::new();
    for name in ["a.jade", "b/c.jade", "b/d/e.styl", "b/f.txt", "g/h/i/j.coffee", "k.jade"] {
        expected.insert(create_test_file(temp.path(), name, "x"));
    }
    fs::create_dir_all(temp.path().join("empty")).unwrap();

    let files = scan_dir(temp.path()).unwrap();
    assert_eq!(files.len(), expected.len());
    assert_eq!(files.into_iter().collect::<HashSet<_>>(), expected);
}

#[test]
fn test_scan_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(scan_dir(&temp.path().join("nope")), Err(ScanError::NotFound(_))));
}

// ============================================================================
// Cleaner Tests
// ============================================================================

#[test]
fn test_clean_on_missing_outputs_is_noop() {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig::resolve(&default_config(), &temp.path().join("fresh")).unwrap();

    let report = clean(&config);
    assert!(report.removed.is_empty());
    assert!(!temp.path().join("fresh").exists());
}

// ============================================================================
// Template Routine Tests
// ============================================================================

#[test]
fn test_template_renders_index() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "templates/jade/index.jade", "h1 Welcome\np Hello there");

    let report = build_templates(&ctx).unwrap();

    assert_eq!(report.built_count(), 1);
    let html = fs::read_to_string(temp.path().join("templates/html/index.html")).unwrap();
    assert_eq!(html, "<h1>Welcome</h1><p>Hello there</p>");
}

#[test]
fn test_template_failure_is_isolated() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "templates/jade/good.jade", "p fine");
    create_test_file(temp.path(), "templates/jade/broken.jade", "p ok\ndiv(class=");

    let report = build_templates(&ctx).unwrap();

    let good = fs::read_to_string(temp.path().join("templates/html/good.html")).unwrap();
    assert_eq!(good, "<p>fine</p>");
    let broken = fs::read_to_string(temp.path().join("templates/html/broken.html")).unwrap();
    assert!(broken.starts_with("<pre>"));
    assert!(broken.contains("broken.jade:2"));
    assert!(broken.contains("unexpected text \"div(class=\""));

    let outcome = report.outcome_for(&temp.path().join("templates/html/broken.html")).unwrap();
    assert!(matches!(outcome.status, FileStatus::Fallback(_)));
}

#[test]
fn test_template_empty_directories_write_nothing() {
    let (temp, ctx) = create_test_context();
    let empty_in = temp.path().join("empty-in");
    let empty_out = temp.path().join("empty-out");
    fs::create_dir_all(&empty_in).unwrap();
    let mut config = ctx.config().clone();
    config.templates_in = Some(empty_in);
    config.templates_out = Some(empty_out.clone());
    let ctx = BuildContext::new(config, capabilities());

    let report = build_templates(&ctx).unwrap();

    assert!(report.files.is_empty());
    assert!(!empty_out.exists());
}

// ============================================================================
// Stylesheet Routine Tests
// ============================================================================

#[tokio::test]
async fn test_stylesheet_failure_is_isolated() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "styles/stylus/site.styl", "body\n  margin 0");
    create_test_file(temp.path(), "styles/stylus/theme/broken.styl", "a {\n  color red");

    let report = build_stylesheets(&ctx).await.unwrap();

    assert_eq!(report.built_count(), 1);
    assert_eq!(report.fallback_count(), 1);
    let site = fs::read_to_string(temp.path().join("styles/css/site.css")).unwrap();
    assert_eq!(site, "body {\n  margin: 0;\n}\n");
    let broken = fs::read_to_string(temp.path().join("styles/css/broken.css")).unwrap();
    assert!(broken.starts_with("ParseError: "));
    assert!(broken.contains("broken.styl"));
}

// ============================================================================
// Script Routine Tests
// ============================================================================

#[test]
fn test_script_bundles_coffee_and_templates() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "scripts/index.coffee", "require './row'\nalert 'hi'");
    create_test_file(temp.path(), "scripts/row.jade", "p row");

    let report = build_script(&ctx).unwrap();

    assert!(report.diagnostics.is_empty());
    let bundle = fs::read_to_string(temp.path().join("scripts/app.js")).unwrap();
    assert!(bundle.starts_with("// module app\n(function() {"));
    assert!(bundle.contains("var jade = {\n  attrs: function attrs(obj) {},"));
    assert!(bundle.contains("module.exports = function template(locals)"));
}

#[test]
fn test_script_reports_unresolved_require() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "scripts/index.coffee", "require './missing'");

    let report = build_script(&ctx).unwrap();

    assert_eq!(report.diagnostics.len(), 1);
    assert!(report.diagnostics[0].starts_with("Could not find module `./missing` from `"));
    assert!(temp.path().join("scripts/app.js").exists());
}

// ============================================================================
// Pipeline Integration Tests
// ============================================================================

#[tokio::test]
async fn test_pipeline_full_build() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "scripts/index.coffee", "alert 'hi'");
    create_test_file(temp.path(), "templates/jade/index.jade", "h1 Home");
    create_test_file(temp.path(), "styles/stylus/site.styl", "body\n  margin 0");

    let result = BuildPipeline::new(ctx).build().await;

    assert!(result.is_success());
    assert_eq!(result.built_count(), 3);
    for kind in [RoutineKind::Script, RoutineKind::Templates, RoutineKind::Stylesheets] {
        assert!(!result.report(kind).unwrap().is_skipped());
    }
    assert!(temp.path().join("scripts/app.js").exists());
    assert!(temp.path().join("templates/html/index.html").exists());
    assert!(temp.path().join("styles/css/site.css").exists());
}

#[tokio::test]
async fn test_pipeline_is_idempotent() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "scripts/index.coffee", "require './nav'\nrequire './gone'");
    create_test_file(temp.path(), "scripts/nav.jade", "p nav");
    create_test_file(temp.path(), "templates/jade/index.jade", "h1 Home");
    create_test_file(temp.path(), "templates/jade/bad.jade", "ul\n  li");
    create_test_file(temp.path(), "styles/stylus/site.styl", "a\n  color red");
    create_test_file(temp.path(), "styles/stylus/bad.styl", "a {");
    let pipeline = BuildPipeline::new(ctx);

    pipeline.build().await;
    let first = snapshot(temp.path());
    pipeline.build().await;
    let second = snapshot(temp.path());

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_pipeline_without_capabilities_writes_nothing() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "scripts/index.coffee", "alert 'hi'");
    create_test_file(temp.path(), "templates/jade/index.jade", "h1 Home");
    let ctx = BuildContext::new(ctx.config().clone(), Capabilities::none());

    let result = BuildPipeline::new(ctx).build().await;

    assert!(result.is_success());
    assert_eq!(result.routines.iter().filter(|r| r.is_skipped()).count(), 3);
    assert!(!temp.path().join("scripts/app.js").exists());
    assert!(!temp.path().join("templates/html").exists());
}

#[tokio::test]
async fn test_pipeline_strict_mode_fails_run() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "templates/jade/bad.jade", "div");
    create_test_file(temp.path(), "styles/stylus/site.styl", "a\n  color red");

    let result = BuildPipeline::new(ctx.with_strict(true)).build().await;

    assert!(!result.is_success());
    assert_eq!(result.failed_count(), 1);
    assert!(!temp.path().join("templates/html/bad.html").exists());
    assert!(temp.path().join("styles/css/site.css").exists());
}

#[tokio::test]
async fn test_pipeline_result_serializes() {
    let (temp, ctx) = create_test_context();
    create_test_file(temp.path(), "scripts/index.coffee", "alert 'hi'");
    create_test_file(temp.path(), "templates/jade/bad.jade", "div");

    let result = BuildPipeline::new(ctx).build().await;
    let json: serde_json::Value = serde_json::to_value(&result).unwrap();

    let routines = json["routines"].as_array().unwrap();
    assert_eq!(routines.len(), 3);
    let templates = routines.iter().find(|r| r["kind"] == "templates").unwrap();
    assert_eq!(templates["files"][0]["status"], "fallback");
    assert!(templates["files"][0]["error"].as_str().unwrap().contains("unexpected text"));
}
