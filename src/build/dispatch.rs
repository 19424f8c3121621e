//! Extension dispatch.
//!
//! Maps a file extension to the handler registered for it. Files whose
//! extension is not registered are skipped without error.

use crate::build::discovery::extension_of;
use std::path::Path;

/// Source extension of CoffeeScript files.
pub const COFFEE_EXT: &str = "coffee";
/// Source extension of Jade templates.
pub const JADE_EXT: &str = "jade";
/// Source extension of Stylus stylesheets.
pub const STYLUS_EXT: &str = "styl";
/// Output extension of rendered templates.
pub const HTML_EXT: &str = "html";
/// Output extension of rendered stylesheets.
pub const CSS_EXT: &str = "css";

/// Static extension-to-handler table.
///
/// Extensions are stored without the leading dot and compared
/// case-sensitively.
#[derive(Debug, Clone)]
pub struct Dispatcher<T> {
    entries: Vec<(String, T)>,
}

impl<T> Dispatcher<T> {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a handler, replacing any handler already registered for `ext`.
    pub fn register(&mut self, ext: &str, handler: T) {
        let ext = ext.trim_start_matches('.');
        match self.entries.iter_mut().find(|(e, _)| e == ext) {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((ext.to_string(), handler)),
        }
    }

    /// Builder form of [`Dispatcher::register`].
    pub fn with(mut self, ext: &str, handler: T) -> Self {
        self.register(ext, handler);
        self
    }

    /// Handler for an extension.
    pub fn get(&self, ext: &str) -> Option<&T> {
        self.entries.iter().find(|(e, _)| e == ext).map(|(_, h)| h)
    }

    /// Handler for a file, by its extension.
    pub fn lookup(&self, path: &Path) -> Option<&T> {
        extension_of(path).and_then(|ext| self.get(ext))
    }

    /// Registered extensions, in registration order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(e, _)| e.as_str())
    }

    /// Consume the table into `(extension, handler)` pairs.
    pub fn into_entries(self) -> impl Iterator<Item = (String, T)> {
        self.entries.into_iter()
    }

    /// Number of registered extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}
