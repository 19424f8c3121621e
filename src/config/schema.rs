//! Configuration schema types for `bake.toml`
//!
//! Defines the structure and validation rules for sitebake project
//! configuration. Every field has a default, so an empty file (or no file
//! at all) describes the conventional project layout.

use crate::build::Locator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Script bundle section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Entry locator, `path` or `path=alias`
    #[serde(default = "default_script_input")]
    pub input: Option<String>,
    /// Bundle output file
    #[serde(default = "default_script_output")]
    pub output: Option<PathBuf>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self { input: default_script_input(), output: default_script_output() }
    }
}

fn default_script_input() -> Option<String> {
    Some("./scripts=app".to_string())
}

fn default_script_output() -> Option<PathBuf> {
    Some(PathBuf::from("./scripts/app.js"))
}

/// Input / output directory pair for a per-file routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirsConfig {
    /// Source tree
    pub input: Option<PathBuf>,
    /// Output directory
    pub output: Option<PathBuf>,
}

impl DirsConfig {
    fn new(input: &str, output: &str) -> Self {
        Self { input: Some(PathBuf::from(input)), output: Some(PathBuf::from(output)) }
    }
}

fn default_templates() -> DirsConfig {
    DirsConfig::new("./templates/jade", "./templates/html")
}

fn default_styles() -> DirsConfig {
    DirsConfig::new("./styles/stylus", "./styles/css")
}

/// Build behavior section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSection {
    /// Delete previous outputs before building
    #[serde(default = "default_true")]
    pub clean: bool,
    /// Fail files instead of writing fallback artifacts
    #[serde(default)]
    pub strict: bool,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self { clean: true, strict: false }
    }
}

fn default_true() -> bool {
    true
}

/// External tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program name or path
    pub command: String,
    /// Arguments; `{file}` is replaced by the source path
    #[serde(default)]
    pub args: Vec<String>,
    /// Set to false to leave the capability out
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ToolCommand {
    /// Create an enabled tool command.
    pub fn new(command: &str, args: &[&str]) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            enabled: true,
        }
    }
}

/// External compilers section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// CoffeeScript compiler
    #[serde(default = "default_script_tool")]
    pub script: ToolCommand,
    /// Jade renderer
    #[serde(default = "default_template_tool")]
    pub template: ToolCommand,
    /// Jade client-function compiler
    #[serde(default = "default_template_client_tool")]
    pub template_client: ToolCommand,
    /// Stylus renderer
    #[serde(default = "default_stylesheet_tool")]
    pub stylesheet: ToolCommand,
    /// Stylus plugin providing the mixin library (e.g. `nib`), used only if the stylesheet tool can load it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mixins: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            script: default_script_tool(),
            template: default_template_tool(),
            template_client: default_template_client_tool(),
            stylesheet: default_stylesheet_tool(),
            mixins: None,
        }
    }
}

fn default_script_tool() -> ToolCommand {
    ToolCommand::new("coffee", &["--stdio", "--print"])
}

fn default_template_tool() -> ToolCommand {
    ToolCommand::new("jade", &["--path", "{file}"])
}

fn default_template_client_tool() -> ToolCommand {
    ToolCommand::new("jade", &["--client", "--path", "{file}"])
}

fn default_stylesheet_tool() -> ToolCommand {
    ToolCommand::new("stylus", &[])
}

/// Complete `bake.toml` configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BakeConfig {
    /// Script bundle
    #[serde(default)]
    pub script: ScriptConfig,
    /// Jade templates
    #[serde(default = "default_templates")]
    pub templates: DirsConfig,
    /// Stylus stylesheets
    #[serde(default = "default_styles")]
    pub styles: DirsConfig,
    /// Build behavior
    #[serde(default)]
    pub build: BuildSection,
    /// External compilers
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            script: ScriptConfig::default(),
            templates: default_templates(),
            styles: default_styles(),
            build: BuildSection::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Validation error for config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "tools.stylesheet.command")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bake.toml: '{}' {}", self.field, self.message)
    }
}

impl BakeConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if let Some(input) = self.script.input.as_deref().filter(|s| !s.is_empty()) {
            if let Err(e) = Locator::parse(input) {
                errors.push(ConfigValidationError {
                    field: "script.input".to_string(),
                    message: e.to_string(),
                });
            }
        }

        let tools = [
            ("script", &self.tools.script),
            ("template", &self.tools.template),
            ("template_client", &self.tools.template_client),
            ("stylesheet", &self.tools.stylesheet),
        ];
        for (name, tool) in tools {
            if tool.enabled && tool.command.trim().is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("tools.{}.command", name),
                    message: "must be a non-empty string".to_string(),
                });
            }
        }

        if self.tools.mixins.as_deref().is_some_and(|m| m.trim().is_empty()) {
            errors.push(ConfigValidationError {
                field: "tools.mixins".to_string(),
                message: "must name a stylesheet plugin".to_string(),
            });
        }

        errors
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}
