//! Compiler and bundler capabilities consumed by the build routines.
//!
//! Sitebake does not implement CoffeeScript, Jade, Stylus or module
//! bundling itself. Each of those is a capability behind a trait, injected
//! into the build through [`crate::build::Capabilities`]. A missing
//! capability turns the routine that needs it into a no-op.
//!
//! [`command`] provides implementations that shell out to the usual
//! command-line compilers when they are installed.

pub mod command;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub use command::*;

/// Diagnostic produced when a single source fails to compile or render.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransformError {
    /// Human-readable diagnostic, written verbatim into fallback artifacts
    pub message: String,
}

impl TransformError {
    /// Create a transform error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }

    /// Create a transform error for a source file that could not be read.
    pub fn unreadable(file: &Path, err: std::io::Error) -> Self {
        Self::new(format!("Error: cannot read {}: {}", file.display(), err))
    }
}

/// Compiles the JavaScript superset (CoffeeScript) to JavaScript.
pub trait ScriptCompiler: Send + Sync {
    /// Compile `source`, read from `file`, to JavaScript.
    fn compile(&self, source: &str, file: &Path) -> Result<String, TransformError>;
}

/// Runtime helpers a client-side template function expects to find in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRuntime {
    /// Source of the attribute serialization helper
    pub attrs: String,
    /// Source of the HTML escaping helper
    pub escape: String,
    /// Source of the error rethrow helper
    pub rethrow: String,
}

/// A template compiled to a client-side render function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTemplate {
    /// Source text of the render function
    pub function: String,
    /// Helpers to inline ahead of the function, when the compiler provides them
    pub runtime: Option<TemplateRuntime>,
}

impl ClientTemplate {
    /// Wrap the render function as a CommonJS module.
    ///
    /// The runtime helpers are inlined as a local `jade` object so the
    /// module does not need the template runtime at load time.
    pub fn into_module_source(self) -> String {
        match self.runtime {
            Some(rt) => format!(
                "var jade = {{\n  attrs: {},\n  escape: {},\n  rethrow: {}\n}};\nmodule.exports = {};",
                rt.attrs, rt.escape, rt.rethrow, self.function
            ),
            None => format!("module.exports = {};", self.function),
        }
    }
}

/// Renders the templating language (Jade) to HTML, or to a client module.
pub trait TemplateCompiler: Send + Sync {
    /// Render `source` to static markup. `file` is used for includes and diagnostics.
    fn render(&self, source: &str, file: &Path) -> Result<String, TransformError>;

    /// Compile `source` to a client-side render function.
    fn compile_client(&self, source: &str, file: &Path) -> Result<ClientTemplate, TransformError>;
}

/// Options for a single stylesheet render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOptions {
    /// Path of the stylesheet being rendered, for imports and diagnostics
    pub filename: PathBuf,
    /// Mixin library plugin to enable (e.g. `nib`)
    pub mixins: Option<String>,
}

/// Renders the CSS preprocessor (Stylus) to CSS.
///
/// Renders are run off the async executor, one blocking task per file.
pub trait StylesheetCompiler: Send + Sync {
    /// Render `source` to CSS.
    fn render(&self, source: &str, options: &StyleOptions) -> Result<String, TransformError>;
}

/// Handler turning one required file into module source text.
pub type ExtensionHandler = Arc<dyn Fn(&Path) -> Result<String, TransformError> + Send + Sync>;

/// Callback invoked when the bundler cannot resolve a require.
///
/// Receives the unresolved module name and the file that required it.
pub type RelaxHandler = Arc<dyn Fn(&str, &Path) + Send + Sync>;

/// Everything a bundler needs to aggregate one entry point.
#[derive(Clone)]
pub struct BundleOptions {
    /// Working directory requires are resolved from
    pub cwd: PathBuf,
    /// Transforms keyed by extension, including the leading dot (`.coffee`)
    pub extensions: BTreeMap<String, ExtensionHandler>,
    /// Unresolved-require callback; reports but does not abort
    pub relax: RelaxHandler,
    /// Root requires: module path to the alias it is exposed under
    pub requires: BTreeMap<String, String>,
}

impl fmt::Debug for BundleOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundleOptions")
            .field("cwd", &self.cwd)
            .field("extensions", &self.extensions.keys().collect::<Vec<_>>())
            .field("requires", &self.requires)
            .finish()
    }
}

/// Aggregates an entry point and its transitive requires into one script.
pub trait Bundler: Send + Sync {
    /// Produce the combined script text.
    fn bundle(&self, options: &BundleOptions) -> Result<String, TransformError>;
}
