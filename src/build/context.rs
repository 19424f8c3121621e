//! Build context containing configuration and capabilities for a build.

use crate::build::{Locator, LocatorError};
use crate::config::BakeConfig;
use crate::transform::{Bundler, ScriptCompiler, StylesheetCompiler, TemplateCompiler};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Resolved configuration for one run.
///
/// Every path is absolute (relative to the project root) and lexically
/// normalized. An absent entry turns its routine into a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Bundle entry point and alias
    pub script_in: Option<Locator>,
    /// Bundle output file
    pub script_out: Option<PathBuf>,
    /// Template source tree
    pub templates_in: Option<PathBuf>,
    /// Rendered HTML directory
    pub templates_out: Option<PathBuf>,
    /// Stylesheet source tree
    pub styles_in: Option<PathBuf>,
    /// Rendered CSS directory
    pub styles_out: Option<PathBuf>,
    /// Delete previous outputs before building
    pub clean: bool,
}

impl BuildConfig {
    /// Resolve a loaded configuration against the project root.
    pub fn resolve(config: &BakeConfig, project_root: &Path) -> Result<Self, LocatorError> {
        let dir = |p: &Option<PathBuf>| {
            p.as_deref()
                .filter(|p| !p.as_os_str().is_empty())
                .map(|p| resolve_path(project_root, p))
        };

        let script_in = match config.script.input.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => {
                let locator = Locator::parse(raw)?;
                let path = resolve_path(project_root, &locator.path);
                Some(locator.with_path(path))
            }
            None => None,
        };

        Ok(Self {
            script_in,
            script_out: dir(&config.script.output),
            templates_in: dir(&config.templates.input),
            templates_out: dir(&config.templates.output),
            styles_in: dir(&config.styles.input),
            styles_out: dir(&config.styles.output),
            clean: config.build.clean,
        })
    }
}

/// Optional compilers and bundler injected at startup.
///
/// Absence of a capability degrades the routine that needs it to a no-op.
#[derive(Clone, Default)]
pub struct Capabilities {
    /// CoffeeScript compiler
    pub script: Option<Arc<dyn ScriptCompiler>>,
    /// Jade renderer / client compiler
    pub templates: Option<Arc<dyn TemplateCompiler>>,
    /// Stylus renderer
    pub stylesheets: Option<Arc<dyn StylesheetCompiler>>,
    /// Stylus mixin library plugin name
    pub mixins: Option<String>,
    /// Module bundler
    pub bundler: Option<Arc<dyn Bundler>>,
}

impl Capabilities {
    /// No capabilities at all.
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the script compiler.
    pub fn with_script(mut self, compiler: Arc<dyn ScriptCompiler>) -> Self {
        self.script = Some(compiler);
        self
    }

    /// Set the template compiler.
    pub fn with_templates(mut self, compiler: Arc<dyn TemplateCompiler>) -> Self {
        self.templates = Some(compiler);
        self
    }

    /// Set the stylesheet compiler.
    pub fn with_stylesheets(mut self, compiler: Arc<dyn StylesheetCompiler>) -> Self {
        self.stylesheets = Some(compiler);
        self
    }

    /// Enable a stylesheet mixin library.
    pub fn with_mixins(mut self, plugin: impl Into<String>) -> Self {
        self.mixins = Some(plugin.into());
        self
    }

    /// Set the bundler.
    pub fn with_bundler(mut self, bundler: Arc<dyn Bundler>) -> Self {
        self.bundler = Some(bundler);
        self
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("script", &self.script.is_some())
            .field("templates", &self.templates.is_some())
            .field("stylesheets", &self.stylesheets.is_some())
            .field("mixins", &self.mixins)
            .field("bundler", &self.bundler.is_some())
            .finish()
    }
}

/// Build context: resolved configuration, capabilities and run modes.
#[derive(Debug, Clone)]
pub struct BuildContext {
    config: BuildConfig,
    capabilities: Capabilities,
    /// Failed files produce no fallback artifact and fail the run
    strict: bool,
    /// Plan tasks without transforming or writing anything
    dry_run: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(config: BuildConfig, capabilities: Capabilities) -> Self {
        Self { config, capabilities, strict: false, dry_run: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Get the capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Whether strict mode is enabled.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Whether this is a dry run.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Set strict mode.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Set dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Resolve a path relative to the project root and normalize it.
pub fn resolve_path(project_root: &Path, path: &Path) -> PathBuf {
    normalize_path(&project_root.join(path))
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
///
/// Leading `..` on a relative path are kept; `..` at the root is dropped.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
