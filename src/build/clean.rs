//! Output cleaning.
//!
//! Removes artifacts a previous run generated: the bundled script and
//! every `.html` / `.css` file under the template and stylesheet output
//! trees. Cleaning never fails; a missing output tree is the normal state
//! on a first run. Every attempt goes through a [`BestEffort`] scope, which
//! records what could not be done instead of raising it.

use crate::build::discovery::{extension_of, scan_dir};
use crate::build::{BuildConfig, CSS_EXT, HTML_EXT};
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What a cleaning pass removed and what it let go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    /// Files deleted
    pub removed: Vec<PathBuf>,
    /// Attempts that failed and were ignored
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ignored: Vec<String>,
}

/// Scope for operations whose failure is acceptable.
///
/// Failures are logged at debug level and kept in the report; they never
/// leave the scope.
#[derive(Debug, Default)]
pub struct BestEffort {
    report: CleanReport,
}

impl BestEffort {
    /// Open a new scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op`, keeping its value on success and recording the failure otherwise.
    pub fn attempt<T, E: Display>(&mut self, what: &str, op: impl FnOnce() -> Result<T, E>) -> Option<T> {
        match op() {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Ignoring failure to {}: {}", what, e);
                self.report.ignored.push(format!("{}: {}", what, e));
                None
            }
        }
    }

    /// Delete a file. A file that is already gone counts as done.
    pub fn remove_file(&mut self, path: &Path) {
        let removed = self.attempt(&format!("remove {}", path.display()), || {
            match fs::remove_file(path) {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e),
            }
        });
        if removed == Some(true) {
            debug!("Removed {}", path.display());
            self.report.removed.push(path.to_path_buf());
        }
    }

    /// Close the scope.
    pub fn finish(self) -> CleanReport {
        self.report
    }
}

/// Delete previously generated outputs.
pub fn clean(config: &BuildConfig) -> CleanReport {
    let mut scope = BestEffort::new();

    if let Some(script_out) = &config.script_out {
        scope.remove_file(script_out);
    }
    if let Some(dir) = &config.templates_out {
        clean_tree(&mut scope, dir, HTML_EXT);
    }
    if let Some(dir) = &config.styles_out {
        clean_tree(&mut scope, dir, CSS_EXT);
    }

    scope.finish()
}

/// Delete every file under `dir` with extension `ext`.
fn clean_tree(scope: &mut BestEffort, dir: &Path, ext: &str) {
    let Some(files) = scope.attempt(&format!("scan {}", dir.display()), || scan_dir(dir)) else {
        return;
    };
    for file in files.iter().filter(|f| extension_of(f) == Some(ext)) {
        scope.remove_file(file);
    }
}
