//! Stylesheet routine: renders every `.styl` file to a `.css` file.
//!
//! Renders run concurrently, one blocking task per file, and the routine
//! completes only after every task has finished. A failed render writes
//! the raw error text as the `.css` output (unless strict).

use crate::build::discovery::discover_sources;
use crate::build::task::{plan_tasks, write_artifact};
use crate::build::{
    BuildContext, BuildError, Dispatcher, FileOutcome, FileStatus, FileTask, RoutineKind,
    RoutineReport, CSS_EXT, STYLUS_EXT,
};
use crate::transform::{StyleOptions, StylesheetCompiler, TransformError};
use std::fs;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Render all stylesheets under the stylesheet input tree.
///
/// Write failures are reported after every render has completed; the
/// first one becomes the routine's error.
pub async fn build_stylesheets(ctx: &BuildContext) -> Result<RoutineReport, BuildError> {
    let start = Instant::now();
    let config = ctx.config();
    let caps = ctx.capabilities();

    let Some(compiler) = &caps.stylesheets else {
        return Ok(skip("no stylesheet compiler available"));
    };
    let (Some(in_dir), Some(out_dir)) = (&config.styles_in, &config.styles_out) else {
        return Ok(skip("no stylesheet input or output configured"));
    };

    debug!("Building stylus {} -> {}", in_dir.display(), out_dir.display());
    let dispatcher = Dispatcher::new().with(STYLUS_EXT, Arc::clone(compiler));
    let tasks = plan_tasks(discover_sources(in_dir), &dispatcher, out_dir, CSS_EXT);

    let mut report = RoutineReport::new(RoutineKind::Stylesheets);
    if ctx.is_dry_run() {
        for task in tasks {
            report.add_file(FileOutcome::new(task.source, task.output, FileStatus::Planned));
        }
        return Ok(report.with_duration(start.elapsed()));
    }

    let mut renders = JoinSet::new();
    for task in tasks {
        let Some(compiler) = dispatcher.get(&task.extension).map(Arc::clone) else {
            continue;
        };
        let options = StyleOptions { filename: task.source.clone(), mixins: caps.mixins.clone() };
        let strict = ctx.is_strict();
        renders.spawn_blocking(move || build_stylesheet(compiler.as_ref(), &task, &options, strict));
    }

    let mut first_error = None;
    while let Some(joined) = renders.join_next().await {
        match joined {
            Ok(Ok(outcome)) => report.add_file(outcome),
            Ok(Err(e)) => {
                error!("{}", e);
                first_error.get_or_insert(e);
            }
            Err(e) => {
                error!("Stylesheet render task failed: {}", e);
                first_error.get_or_insert(BuildError::Task(e.to_string()));
            }
        }
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    // Completion order is arbitrary
    report.files.sort_by(|a, b| a.source.cmp(&b.source));
    Ok(report.with_duration(start.elapsed()))
}

fn skip(reason: &str) -> RoutineReport {
    debug!("Skipping stylesheets: {}", reason);
    RoutineReport::skipped(RoutineKind::Stylesheets, reason)
}

/// Read and render one stylesheet.
pub fn render_stylesheet(
    compiler: &dyn StylesheetCompiler,
    options: &StyleOptions,
) -> Result<String, TransformError> {
    let file = &options.filename;
    let source = fs::read_to_string(file).map_err(|e| TransformError::unreadable(file, e))?;
    compiler.render(&source, options)
}

fn build_stylesheet(
    compiler: &dyn StylesheetCompiler,
    task: &FileTask,
    options: &StyleOptions,
    strict: bool,
) -> Result<FileOutcome, BuildError> {
    let (css, status) = match render_stylesheet(compiler, options) {
        Ok(css) => (Some(css), FileStatus::Built),
        Err(e) => {
            error!(file = %task.source.display(), "{}", e);
            if strict {
                (None, FileStatus::Failed(e.to_string()))
            } else {
                (Some(e.to_string()), FileStatus::Fallback(e.to_string()))
            }
        }
    };

    if let Some(css) = css {
        write_artifact(&task.output, &css)?;
        info!("Built CSS    @ {}", task.output.display());
    }

    Ok(FileOutcome::new(task.source.clone(), task.output.clone(), status))
}
