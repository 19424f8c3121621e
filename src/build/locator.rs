//! Script entry locators.
//!
//! A locator names the bundle entry point and the alias it is required
//! under: `path` or `path=alias`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Error parsing a locator string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocatorError {
    /// The path part was empty
    #[error("Script locator '{0}' has an empty path")]
    EmptyPath(String),
}

/// Bundle entry point plus the logical module name it is exposed as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// Entry path, as written
    pub path: PathBuf,
    /// Alias the entry is required under
    pub alias: String,
}

impl Locator {
    /// Create a locator from its parts.
    pub fn new(path: impl Into<PathBuf>, alias: impl Into<String>) -> Self {
        Self { path: path.into(), alias: alias.into() }
    }

    /// Parse `path` or `path=alias`.
    ///
    /// Only the first `=` separates path and alias. Without an alias (or
    /// with an empty one) the raw path doubles as the alias.
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        let (path, alias) = match raw.split_once('=') {
            Some((path, alias)) if !alias.is_empty() => (path, alias),
            Some((path, _)) => (path, path),
            None => (raw, raw),
        };

        if path.is_empty() {
            return Err(LocatorError::EmptyPath(raw.to_string()));
        }

        Ok(Self { path: PathBuf::from(path), alias: alias.to_string() })
    }

    /// Replace the path, keeping the alias.
    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locator::parse(s)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.path.display(), self.alias)
    }
}
