//! Source file discovery for the build routines.
//!
//! Recursively enumerates the regular files under a directory.

use glob::{glob_with, MatchOptions, Pattern};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Error during directory scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Scan root does not exist
    #[error("Directory not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Scan root exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// Root could not be turned into a pattern
    #[error("Invalid scan root '{}': {source}", .path.display())]
    Pattern {
        path: PathBuf,
        #[source]
        source: glob::PatternError,
    },
    /// IO error during enumeration
    #[error("IO error while scanning {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Recursively list every regular file under `root`.
///
/// Files come back depth-first, in per-directory name order. A missing or
/// unreadable root is an error, never an empty result.
pub fn scan_dir(root: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let meta = fs::metadata(root).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        _ => ScanError::Io { path: root.to_path_buf(), source: e },
    })?;
    if !meta.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    // Escape the root so brackets or stars in directory names stay literal
    let escaped = Pattern::escape(&root.to_string_lossy());
    let pattern = format!("{}/**/*", escaped.trim_end_matches('/'));
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    let entries = glob_with(&pattern, options)
        .map_err(|e| ScanError::Pattern { path: root.to_path_buf(), source: e })?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => {
                let path = e.path().to_path_buf();
                return Err(ScanError::Io { path, source: e.into_error() });
            }
        }
    }

    Ok(files)
}

/// Source files under `dir` for a build routine.
///
/// A tree that cannot be scanned means there is nothing to build.
pub fn discover_sources(dir: &Path) -> Vec<PathBuf> {
    match scan_dir(dir) {
        Ok(files) => files,
        Err(e) => {
            debug!("No sources: {}", e);
            Vec::new()
        }
    }
}

/// Extension of a path as a string, without the leading dot.
pub fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|e| e.to_str())
}
