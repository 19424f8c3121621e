//! Build result types.
//!
//! Contains types for representing the outcome of a build run, per file,
//! per routine and for the whole pipeline.

use crate::build::CleanReport;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Which build routine produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    /// CoffeeScript bundle
    Script,
    /// Jade templates to HTML
    Templates,
    /// Stylus to CSS
    Stylesheets,
}

impl std::fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutineKind::Script => write!(f, "script"),
            RoutineKind::Templates => write!(f, "templates"),
            RoutineKind::Stylesheets => write!(f, "stylesheets"),
        }
    }
}

/// Status of a single output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "lowercase")]
pub enum FileStatus {
    /// Transform succeeded and the output was written
    Built,
    /// Transform failed; the diagnostic was written in place of the output
    Fallback(String),
    /// Transform failed and nothing was written (strict mode)
    Failed(String),
    /// Dry run: would have been built
    Planned,
}

impl FileStatus {
    /// Check if the status indicates a transform failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, FileStatus::Fallback(_) | FileStatus::Failed(_))
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Built => write!(f, "built"),
            FileStatus::Fallback(err) => write!(f, "fallback: {}", err),
            FileStatus::Failed(err) => write!(f, "failed: {}", err),
            FileStatus::Planned => write!(f, "planned"),
        }
    }
}

/// Outcome for one output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Source file (the entry directory for the script bundle)
    pub source: PathBuf,
    /// Output file
    pub output: PathBuf,
    /// What happened
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileOutcome {
    /// Create an outcome.
    pub fn new(source: PathBuf, output: PathBuf, status: FileStatus) -> Self {
        Self { source, output, status }
    }
}

/// Result of one build routine.
#[derive(Debug, Clone, Serialize)]
pub struct RoutineReport {
    /// Routine that ran
    pub kind: RoutineKind,
    /// Why the routine did not run, if it was skipped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<String>,
    /// Per-file outcomes
    pub files: Vec<FileOutcome>,
    /// Non-fatal diagnostics (e.g. unresolved requires)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    /// Routine duration
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl RoutineReport {
    /// Create an empty report for a routine that ran.
    pub fn new(kind: RoutineKind) -> Self {
        Self { kind, skipped: None, files: vec![], diagnostics: vec![], duration: Duration::ZERO }
    }

    /// Create a report for a routine whose preconditions were not met.
    pub fn skipped(kind: RoutineKind, reason: impl Into<String>) -> Self {
        Self { skipped: Some(reason.into()), ..Self::new(kind) }
    }

    /// Whether the routine was skipped.
    pub fn is_skipped(&self) -> bool {
        self.skipped.is_some()
    }

    /// Add a file outcome.
    pub fn add_file(&mut self, outcome: FileOutcome) {
        self.files.push(outcome);
    }

    /// Set the duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Number of files built.
    pub fn built_count(&self) -> usize {
        self.files.iter().filter(|f| f.status == FileStatus::Built).count()
    }

    /// Number of files that fell back to an error artifact.
    pub fn fallback_count(&self) -> usize {
        self.files.iter().filter(|f| matches!(f.status, FileStatus::Fallback(_))).count()
    }

    /// Number of files that failed without output.
    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| matches!(f.status, FileStatus::Failed(_))).count()
    }

    /// Number of files planned in a dry run.
    pub fn planned_count(&self) -> usize {
        self.files.iter().filter(|f| f.status == FileStatus::Planned).count()
    }

    /// Outcome for a given output path.
    pub fn outcome_for(&self, output: &std::path::Path) -> Option<&FileOutcome> {
        self.files.iter().find(|f| f.output == output)
    }
}

/// A routine that failed as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineFailure {
    /// Routine that failed
    pub kind: RoutineKind,
    /// Error message
    pub error: String,
}

/// Result of a complete build run.
#[derive(Debug, Default, Serialize)]
pub struct BuildResult {
    /// Cleaner report, if cleaning ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<CleanReport>,
    /// Reports of routines that completed
    pub routines: Vec<RoutineReport>,
    /// Routines that failed as a whole
    pub failures: Vec<RoutineFailure>,
    /// Total build duration
    #[serde(serialize_with = "serialize_millis")]
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a routine report.
    pub fn add_report(&mut self, report: RoutineReport) {
        self.routines.push(report);
    }

    /// Record a routine failure.
    pub fn add_failure(&mut self, kind: RoutineKind, error: String) {
        self.failures.push(RoutineFailure { kind, error });
    }

    /// Report for a routine, if it completed.
    pub fn report(&self, kind: RoutineKind) -> Option<&RoutineReport> {
        self.routines.iter().find(|r| r.kind == kind)
    }

    /// Failure for a routine, if it failed.
    pub fn failure(&self, kind: RoutineKind) -> Option<&RoutineFailure> {
        self.failures.iter().find(|f| f.kind == kind)
    }

    /// All file outcomes across routines.
    pub fn files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.routines.iter().flat_map(|r| r.files.iter())
    }

    /// Get the number of files built.
    pub fn built_count(&self) -> usize {
        self.routines.iter().map(RoutineReport::built_count).sum()
    }

    /// Get the number of fallback artifacts written.
    pub fn fallback_count(&self) -> usize {
        self.routines.iter().map(RoutineReport::fallback_count).sum()
    }

    /// Get the number of files that failed without output.
    pub fn failed_count(&self) -> usize {
        self.routines.iter().map(RoutineReport::failed_count).sum()
    }

    /// Get the number of files planned.
    pub fn planned_count(&self) -> usize {
        self.routines.iter().map(RoutineReport::planned_count).sum()
    }

    /// Check if the overall build succeeded.
    ///
    /// Fallback artifacts do not fail a build; routine failures and strict
    /// per-file failures do.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.failed_count() == 0
    }

    /// Format a summary of the build result.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        let built = self.built_count();
        let fallback = self.fallback_count();
        let failed = self.failed_count();
        let planned = self.planned_count();

        if planned > 0 {
            lines.push(format!("Dry run: {} file(s) would be built", planned));
            for file in self.files().filter(|f| f.status == FileStatus::Planned) {
                lines.push(format!("  - {} -> {}", file.source.display(), file.output.display()));
            }
        } else if self.is_success() {
            lines.push(format!(
                "Build succeeded: {} built, {} with errors in place in {:?}",
                built, fallback, self.total_duration
            ));
        } else {
            lines.push(format!(
                "Build failed: {} built, {} with errors in place, {} failed",
                built, fallback, failed
            ));
            for failure in &self.failures {
                lines.push(format!("  - {}: {}", failure.kind, failure.error));
            }
            for file in self.files().filter(|f| matches!(f.status, FileStatus::Failed(_))) {
                lines.push(format!("  - {}: {}", file.source.display(), file.status));
            }
        }

        let skipped: Vec<_> = self.routines.iter().filter(|r| r.is_skipped()).collect();
        for report in skipped {
            lines.push(format!(
                "Skipped {}: {}",
                report.kind,
                report.skipped.as_deref().unwrap_or_default()
            ));
        }

        let diagnostics: Vec<_> = self.routines.iter().flat_map(|r| r.diagnostics.iter()).collect();
        if !diagnostics.is_empty() {
            lines.push(format!("Diagnostics ({}):", diagnostics.len()));
            for diagnostic in diagnostics.iter().take(5) {
                lines.push(format!("  - {}", diagnostic));
            }
            if diagnostics.len() > 5 {
                lines.push(format!("  ... and {} more", diagnostics.len() - 5));
            }
        }

        lines.join("\n")
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(name: &str, status: FileStatus) -> FileOutcome {
        FileOutcome::new(
            PathBuf::from(format!("/in/{}.jade", name)),
            PathBuf::from(format!("/out/{}.html", name)),
            status,
        )
    }

    #[test]
    fn test_file_status_display() {
        assert_eq!(FileStatus::Built.to_string(), "built");
        assert_eq!(FileStatus::Planned.to_string(), "planned");
        assert_eq!(FileStatus::Fallback("boom".to_string()).to_string(), "fallback: boom");
        assert_eq!(FileStatus::Failed("boom".to_string()).to_string(), "failed: boom");
    }

    #[test]
    fn test_file_status_is_failure() {
        assert!(!FileStatus::Built.is_failure());
        assert!(FileStatus::Fallback("e".to_string()).is_failure());
        assert!(FileStatus::Failed("e".to_string()).is_failure());
    }

    #[test]
    fn test_routine_report_counts() {
        let mut report = RoutineReport::new(RoutineKind::Templates);
        report.add_file(outcome("a", FileStatus::Built));
        report.add_file(outcome("b", FileStatus::Fallback("e".to_string())));
        report.add_file(outcome("c", FileStatus::Failed("e".to_string())));

        assert_eq!(report.built_count(), 1);
        assert_eq!(report.fallback_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert!(report.outcome_for(std::path::Path::new("/out/b.html")).is_some());
    }

    #[test]
    fn test_routine_report_skipped() {
        let report = RoutineReport::skipped(RoutineKind::Script, "no bundler");
        assert!(report.is_skipped());
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_build_result_fallback_is_success() {
        let mut report = RoutineReport::new(RoutineKind::Templates);
        report.add_file(outcome("a", FileStatus::Built));
        report.add_file(outcome("b", FileStatus::Fallback("e".to_string())));

        let mut result = BuildResult::new();
        result.add_report(report);
        assert!(result.is_success());
        assert_eq!(result.fallback_count(), 1);
    }

    #[test]
    fn test_build_result_failures() {
        let mut result = BuildResult::new();
        result.add_failure(RoutineKind::Script, "SyntaxError".to_string());

        assert!(!result.is_success());
        assert!(result.failure(RoutineKind::Script).is_some());
        assert!(result.summary().contains("Build failed"));
        assert!(result.summary().contains("script: SyntaxError"));
    }

    #[test]
    fn test_build_result_strict_failure() {
        let mut report = RoutineReport::new(RoutineKind::Stylesheets);
        report.add_file(outcome("a", FileStatus::Failed("e".to_string())));

        let mut result = BuildResult::new();
        result.add_report(report);
        assert!(!result.is_success());
    }

    #[test]
    fn test_build_result_summary_success() {
        let mut report = RoutineReport::new(RoutineKind::Templates);
        report.add_file(outcome("a", FileStatus::Built));
        let mut result = BuildResult::new();
        result.add_report(report);
        result.add_report(RoutineReport::skipped(RoutineKind::Script, "no bundler available"));

        let summary = result.summary();
        assert!(summary.contains("Build succeeded: 1 built"));
        assert!(summary.contains("Skipped script: no bundler available"));
    }

    #[test]
    fn test_build_result_summary_dry_run() {
        let mut report = RoutineReport::new(RoutineKind::Templates);
        report.add_file(outcome("a", FileStatus::Planned));
        let mut result = BuildResult::new();
        result.add_report(report);

        let summary = result.summary();
        assert!(summary.contains("Dry run: 1 file(s) would be built"));
        assert!(summary.contains("/in/a.jade -> /out/a.html"));
    }

    #[test]
    fn test_build_result_serializes() {
        let mut report = RoutineReport::new(RoutineKind::Stylesheets);
        report.add_file(outcome("a", FileStatus::Fallback("bad".to_string())));
        let mut result = BuildResult::new();
        result.add_report(report);

        let json = serde_json::to_value(&result).unwrap();
        let file = &json["routines"][0]["files"][0];
        assert_eq!(json["routines"][0]["kind"], "stylesheets");
        assert_eq!(file["status"], "fallback");
        assert_eq!(file["error"], "bad");
    }
}
