//! Per-file build tasks.
//!
//! A [`FileTask`] pairs a discovered source with the output path it
//! compiles to. Outputs are flat: every source lands directly in the
//! output directory under its own file stem, whatever subdirectory it
//! was found in.

use crate::build::discovery::extension_of;
use crate::build::pipeline::BuildError;
use crate::build::Dispatcher;
use std::fs;
use std::path::{Path, PathBuf};

/// A discovered input file and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// Source file
    pub source: PathBuf,
    /// Source extension, without the dot
    pub extension: String,
    /// Output file
    pub output: PathBuf,
}

impl FileTask {
    /// Create a task for `source`, writing into `out_dir` with `output_ext`.
    ///
    /// Returns `None` for paths without a file stem or extension.
    pub fn new(source: PathBuf, out_dir: &Path, output_ext: &str) -> Option<Self> {
        let extension = extension_of(&source)?.to_string();
        let output = output_path(&source, out_dir, output_ext)?;
        Some(Self { source, extension, output })
    }
}

/// Map a source path to `out_dir/<stem>.<output_ext>`.
///
/// Only the last extension is replaced: `a.min.styl` becomes `a.min.css`.
pub fn output_path(source: &Path, out_dir: &Path, output_ext: &str) -> Option<PathBuf> {
    let stem = source.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".");
    name.push(output_ext);
    Some(out_dir.join(name))
}

/// Build tasks for every file with a registered extension.
///
/// Files the dispatcher does not know are dropped silently.
pub fn plan_tasks<T>(
    files: Vec<PathBuf>,
    dispatcher: &Dispatcher<T>,
    out_dir: &Path,
    output_ext: &str,
) -> Vec<FileTask> {
    files
        .into_iter()
        .filter(|f| dispatcher.lookup(f).is_some())
        .filter_map(|f| FileTask::new(f, out_dir, output_ext))
        .collect()
}

/// Write an artifact, creating its directory first.
///
/// The write is a plain overwrite.
pub fn write_artifact(path: &Path, contents: &str) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| BuildError::Io { path: parent.to_path_buf(), source: e })?;
        }
    }
    fs::write(path, contents).map_err(|e| BuildError::Io { path: path.to_path_buf(), source: e })
}
