//! Build command implementations (build, clean)

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::debug;

use super::{PathArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::{clean, normalize_path, BuildConfig, Locator, LocatorError};
use crate::config::{
    default_config, find_config, load_config, merge_cli_overrides, project_root, BakeConfig,
    CliOverrides,
};

/// Run-mode flags of the build command
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildOptions {
    /// Override the configured clean flag
    pub clean: Option<bool>,
    /// Strict mode
    pub strict: bool,
    /// Plan only
    pub dry_run: bool,
    /// JSON result on stdout
    pub json: bool,
}

/// Run the build command
pub fn run_build(paths: &PathArgs, options: &BuildOptions, verbose: bool) -> ExitCode {
    use crate::build::{BuildContext, BuildPipeline};
    use crate::config::capabilities_from;
    use tokio::runtime::Runtime;

    crate::logging::init(verbose);

    let overrides = CliOverrides {
        clean: options.clean,
        strict: options.strict.then_some(true),
        ..Default::default()
    };
    let (config, build_config) = match resolve_project(paths, overrides) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let context = BuildContext::new(build_config, capabilities_from(&config.tools))
        .with_strict(config.build.strict)
        .with_dry_run(options.dry_run);
    let pipeline = BuildPipeline::new(context);

    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create runtime: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let result = rt.block_on(pipeline.build());

    if options.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                return ExitCode::from(EXIT_ERROR);
            }
        }
    } else if result.is_success() {
        println!("{}", result.summary());
    } else {
        eprintln!("{}", result.summary());
    }

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the clean command
pub fn run_clean(paths: &PathArgs, verbose: bool) -> ExitCode {
    crate::logging::init(verbose);

    let (_, build_config) = match resolve_project(paths, CliOverrides::default()) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let report = clean(&build_config);
    for path in &report.removed {
        println!("Removed {}", path.display());
    }
    println!("Cleaned {} file(s)", report.removed.len());
    ExitCode::from(EXIT_SUCCESS)
}

/// Load the configuration, apply the path flags and resolve every path.
///
/// File paths are relative to the directory holding `bake.toml`; flag paths
/// are relative to the working directory.
fn resolve_project(
    paths: &PathArgs,
    mut overrides: CliOverrides,
) -> Result<(BakeConfig, BuildConfig), String> {
    let cwd = std::env::current_dir().map_err(|e| format!("Cannot read working directory: {}", e))?;

    let config_path = match &paths.config {
        Some(path) => Some(cwd.join(path)),
        None => find_config(),
    };
    let mut config = match &config_path {
        Some(path) => {
            debug!("Using config: {}", path.display());
            load_config(Some(path)).map_err(|e| e.to_string())?
        }
        None => {
            debug!("No bake.toml found, using defaults");
            default_config()
        }
    };
    let root = config_path
        .as_deref()
        .and_then(project_root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| cwd.clone());

    let script_in = match &paths.script_in {
        Some(raw) => Some(absolute_locator(&cwd, raw).map_err(|e| e.to_string())?),
        None => None,
    };
    overrides.script_out = paths.script_out.as_deref().map(|p| absolute(&cwd, p));
    overrides.jade_in = paths.jade_in.as_deref().map(|p| absolute(&cwd, p));
    overrides.jade_out = paths.jade_out.as_deref().map(|p| absolute(&cwd, p));
    overrides.stylus_in = paths.stylus_in.as_deref().map(|p| absolute(&cwd, p));
    overrides.stylus_out = paths.stylus_out.as_deref().map(|p| absolute(&cwd, p));
    merge_cli_overrides(&mut config, &overrides);

    let mut build_config = BuildConfig::resolve(&config, &root).map_err(|e| e.to_string())?;
    // Flag locator is already parsed and anchored at the cwd
    if let Some(locator) = script_in {
        build_config.script_in = locator;
    }
    Ok((config, build_config))
}

/// Anchor a flag path at the working directory; empty stays empty.
fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        PathBuf::new()
    } else {
        normalize_path(&cwd.join(path))
    }
}

/// Parse a `--script-in` value and anchor its path; empty disables the script.
fn absolute_locator(cwd: &Path, raw: &str) -> Result<Option<Locator>, LocatorError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let locator = Locator::parse(raw)?;
    let path = absolute(cwd, &locator.path);
    Ok(Some(locator.with_path(path)))
}
