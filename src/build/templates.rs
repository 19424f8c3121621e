//! Template routine: renders every `.jade` file to an `.html` page.
//!
//! Each file is independent. A file that fails to render still gets its
//! output: the diagnostic wrapped in a `<pre>` block, so the broken page is
//! visible where the page should be. Strict mode writes nothing instead.

use crate::build::discovery::discover_sources;
use crate::build::task::{plan_tasks, write_artifact};
use crate::build::{
    BuildContext, BuildError, Dispatcher, FileOutcome, FileStatus, FileTask, RoutineKind,
    RoutineReport, HTML_EXT, JADE_EXT,
};
use crate::transform::{TemplateCompiler, TransformError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Render all templates under the template input tree.
///
/// Only write failures abort the routine.
pub fn build_templates(ctx: &BuildContext) -> Result<RoutineReport, BuildError> {
    let start = Instant::now();
    let config = ctx.config();

    let Some(compiler) = &ctx.capabilities().templates else {
        return Ok(skip("no template compiler available"));
    };
    let (Some(in_dir), Some(out_dir)) = (&config.templates_in, &config.templates_out) else {
        return Ok(skip("no template input or output configured"));
    };

    debug!("Building jade {} -> {}", in_dir.display(), out_dir.display());
    let dispatcher = Dispatcher::new().with(JADE_EXT, Arc::clone(compiler));
    let tasks = plan_tasks(discover_sources(in_dir), &dispatcher, out_dir, HTML_EXT);

    let mut report = RoutineReport::new(RoutineKind::Templates);
    for task in tasks {
        if ctx.is_dry_run() {
            report.add_file(FileOutcome::new(task.source, task.output, FileStatus::Planned));
            continue;
        }
        let Some(compiler) = dispatcher.get(&task.extension) else {
            continue;
        };
        report.add_file(build_template(compiler.as_ref(), &task, ctx.is_strict())?);
    }

    Ok(report.with_duration(start.elapsed()))
}

fn skip(reason: &str) -> RoutineReport {
    debug!("Skipping templates: {}", reason);
    RoutineReport::skipped(RoutineKind::Templates, reason)
}

/// Read and render one template.
pub fn render_template(compiler: &dyn TemplateCompiler, file: &Path) -> Result<String, TransformError> {
    let source = fs::read_to_string(file).map_err(|e| TransformError::unreadable(file, e))?;
    compiler.render(&source, file)
}

/// Markup written in place of a page that failed to render.
pub fn error_markup(err: &TransformError) -> String {
    format!("<pre>{}</pre>", err)
}

fn build_template(
    compiler: &dyn TemplateCompiler,
    task: &FileTask,
    strict: bool,
) -> Result<FileOutcome, BuildError> {
    let (html, status) = match render_template(compiler, &task.source) {
        Ok(html) => (Some(html), FileStatus::Built),
        Err(e) => {
            error!(file = %task.source.display(), "{}", e);
            if strict {
                (None, FileStatus::Failed(e.to_string()))
            } else {
                (Some(error_markup(&e)), FileStatus::Fallback(e.to_string()))
            }
        }
    };

    if let Some(html) = html {
        write_artifact(&task.output, &html)?;
        info!("Built HTML   @ {}", task.output.display());
    }

    Ok(FileOutcome::new(task.source.clone(), task.output.clone(), status))
}
