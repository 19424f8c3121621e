//! Build pipeline orchestration.
//!
//! The pipeline cleans previous outputs, then runs the script, template and
//! stylesheet routines in that order. Routines are independent: a routine
//! that fails is recorded and the next one still runs.

use crate::build::clean::clean;
use crate::build::script::build_script;
use crate::build::styles::build_stylesheets;
use crate::build::templates::build_templates;
use crate::build::{BuildContext, BuildResult, RoutineKind, RoutineReport};
use crate::transform::TransformError;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error};

/// Error that aborts a single routine.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The bundler could not produce a bundle
    #[error("Bundle error: {0}")]
    Bundle(#[source] TransformError),
    /// An output could not be written
    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A background task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}

/// Build pipeline for executing builds.
pub struct BuildPipeline {
    context: BuildContext,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    pub fn new(context: BuildContext) -> Self {
        Self { context }
    }

    /// Get the build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Run one complete build.
    ///
    /// Never fails as a whole; routine failures are collected in the
    /// result. Cleaning is skipped on dry runs.
    pub async fn build(&self) -> BuildResult {
        let start = Instant::now();
        let mut result = BuildResult::new();

        if self.context.config().clean && !self.context.is_dry_run() {
            let report = clean(self.context.config());
            debug!("Cleaned {} file(s)", report.removed.len());
            result.clean = Some(report);
        }

        record(&mut result, RoutineKind::Script, build_script(&self.context));
        record(&mut result, RoutineKind::Templates, build_templates(&self.context));
        record(&mut result, RoutineKind::Stylesheets, build_stylesheets(&self.context).await);

        result.total_duration = start.elapsed();
        result
    }
}

fn record(result: &mut BuildResult, kind: RoutineKind, outcome: Result<RoutineReport, BuildError>) {
    match outcome {
        Ok(report) => result.add_report(report),
        Err(e) => {
            error!("Failed to build {}: {}", kind, e);
            result.add_failure(kind, e.to_string());
        }
    }
}
