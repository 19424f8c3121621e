//! Configuration loading and discovery for `bake.toml`
//!
//! Provides functions to find, load, and merge configuration, and to turn
//! the `[tools]` section into build capabilities.

use super::schema::{BakeConfig, ToolCommand, ToolsConfig};
use crate::build::Capabilities;
use crate::transform::{
    CommandScriptCompiler, CommandSpec, CommandStylesheetCompiler, CommandTemplateCompiler,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "bake.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse bake.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
///
/// An empty string disables the corresponding entry.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Script entry locator
    pub script_in: Option<String>,
    /// Script bundle output file
    pub script_out: Option<PathBuf>,
    /// Template source tree
    pub jade_in: Option<PathBuf>,
    /// Rendered HTML directory
    pub jade_out: Option<PathBuf>,
    /// Stylesheet source tree
    pub stylus_in: Option<PathBuf>,
    /// Rendered CSS directory
    pub stylus_out: Option<PathBuf>,
    /// Clean before building
    pub clean: Option<bool>,
    /// Strict mode
    pub strict: Option<bool>,
}

/// Find bake.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for bake.toml
/// 2. Check XDG_CONFIG_HOME/sitebake/bake.toml (or ~/.config/sitebake/bake.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find bake.toml in XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("sitebake").join(CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find bake.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a bake.toml file.
///
/// If a path is provided, loads from that file. Otherwise, uses `find_config()`
/// to locate the config file. If no config file is found, returns the
/// default configuration.
///
/// # Example
/// ```ignore
/// // Load from discovered config
/// let config = load_config(None)?;
///
/// // Load from specific path
/// let config = load_config(Some(Path::new("site/bake.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<BakeConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(default_config()),
    }
}

/// Load configuration from a specific file path.
pub fn load_config_file(path: &Path) -> Result<BakeConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: BakeConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Default configuration when no bake.toml is found.
///
/// Lays the project out as `scripts/`, `templates/jade` -> `templates/html`
/// and `styles/stylus` -> `styles/css`.
pub fn default_config() -> BakeConfig {
    BakeConfig::default()
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut BakeConfig, overrides: &CliOverrides) {
    if let Some(ref script_in) = overrides.script_in {
        config.script.input = Some(script_in.clone());
    }
    if let Some(ref script_out) = overrides.script_out {
        config.script.output = Some(script_out.clone());
    }

    if let Some(ref jade_in) = overrides.jade_in {
        config.templates.input = Some(jade_in.clone());
    }
    if let Some(ref jade_out) = overrides.jade_out {
        config.templates.output = Some(jade_out.clone());
    }

    if let Some(ref stylus_in) = overrides.stylus_in {
        config.styles.input = Some(stylus_in.clone());
    }
    if let Some(ref stylus_out) = overrides.stylus_out {
        config.styles.output = Some(stylus_out.clone());
    }

    if let Some(clean) = overrides.clean {
        config.build.clean = clean;
    }
    if let Some(strict) = overrides.strict {
        config.build.strict = strict;
    }
}

/// Get the project root directory from a config file path.
///
/// Returns the parent directory of the bake.toml file.
pub fn project_root(config_path: &Path) -> Option<&Path> {
    config_path.parent()
}

/// Detect the external compilers named in `[tools]`.
///
/// A tool that is disabled or not installed leaves its capability absent.
/// No bundler is ever detected; library users inject one.
pub fn capabilities_from(tools: &ToolsConfig) -> Capabilities {
    let mut caps = Capabilities::none();

    if let Some(compiler) = command_spec(&tools.script).and_then(CommandScriptCompiler::detect) {
        caps = caps.with_script(Arc::new(compiler));
    }

    if let Some(render) = command_spec(&tools.template) {
        let client = command_spec(&tools.template_client);
        if let Some(compiler) = CommandTemplateCompiler::detect(render, client) {
            caps = caps.with_templates(Arc::new(compiler));
        }
    }

    if let Some(compiler) =
        command_spec(&tools.stylesheet).and_then(CommandStylesheetCompiler::detect)
    {
        if let Some(ref plugin) = tools.mixins {
            if compiler.supports_plugin(plugin) {
                caps = caps.with_mixins(plugin.clone());
            } else {
                warn!("Stylus plugin '{}' is not available, building without it", plugin);
            }
        }
        caps = caps.with_stylesheets(Arc::new(compiler));
    }

    debug!("Detected capabilities: {:?}", caps);
    caps
}

fn command_spec(tool: &ToolCommand) -> Option<CommandSpec> {
    tool.enabled.then(|| CommandSpec::new(tool.command.clone(), tool.args.clone()))
}
