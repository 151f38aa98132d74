//! Progress reporting for the roster pipeline.
//!
//! Every cleaning rule and the deduplicator emit one [`ProgressUpdate`]
//! carrying the exact number of rows they removed, so a reporter sees the same
//! accounting that ends up in the run report.
//!
//! # Example
//!
//! ```rust,ignore
//! use graduate_roster::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .process(df);
//! ```

use crate::types::FilterReport;
use serde::{Deserialize, Serialize};

/// Stages of the roster pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Resolving headers and parsing field values
    Normalizing,
    /// Running the ordered cleaning rules
    Filtering,
    /// Removing duplicate `(id, name)` keys
    Deduplicating,
    /// Deriving grade and honors predicate
    Classifying,
    /// Computing per-program statistics
    Aggregating,
    /// Pipeline completed successfully
    Complete,
    /// Pipeline failed with an error
    Failed,
}

impl PipelineStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Normalizing => "Normalizing Roster",
            Self::Filtering => "Applying Cleaning Rules",
            Self::Deduplicating => "Removing Duplicates",
            Self::Classifying => "Classifying Graduates",
            Self::Aggregating => "Aggregating Programs",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the overall run taken by this stage (0.0 - 1.0).
    pub fn weight(&self) -> f32 {
        match self {
            Self::Normalizing => 0.10,
            Self::Filtering => 0.45,
            Self::Deduplicating => 0.10,
            Self::Classifying => 0.15,
            Self::Aggregating => 0.20,
            Self::Complete | Self::Failed => 0.0,
        }
    }

    /// Cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Normalizing => 0.0,
            Self::Filtering => 0.10,
            Self::Deduplicating => 0.55,
            Self::Classifying => 0.65,
            Self::Aggregating => 0.80,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// A single progress notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PipelineStage,

    /// Overall progress (0.0 - 1.0)
    pub progress: f32,

    /// Progress within current stage (0.0 - 1.0)
    pub stage_progress: f32,

    pub message: String,

    /// Identifier of the rule that produced this update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,

    /// Rows removed by the step that produced this update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_removed: Option<usize>,

    /// Rows left in the table after the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_remaining: Option<usize>,
}

impl ProgressUpdate {
    pub fn new(stage: PipelineStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + (stage.weight() * stage_progress);
        Self {
            stage,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message: message.into(),
            rule: None,
            rows_removed: None,
            rows_remaining: None,
        }
    }

    /// Update for one finished cleaning step, `step` of `total`.
    pub fn for_step(stage: PipelineStage, step: usize, total: usize, report: &FilterReport) -> Self {
        let stage_progress = if total > 0 {
            step as f32 / total as f32
        } else {
            1.0
        };
        Self {
            rule: Some(report.rule.clone()),
            rows_removed: Some(report.removed),
            rows_remaining: Some(report.rows_after()),
            ..Self::new(stage, stage_progress, report.console_line())
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::new(PipelineStage::Complete, 1.0, message)
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            progress: 0.0,
            ..Self::new(PipelineStage::Failed, 0.0, message)
        }
    }
}

/// Receives progress updates from a running pipeline.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Wrapper that implements [`ProgressReporter`] using a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RuleAction;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PipelineStage::Filtering, 0.5, "Filtering...");
        assert_eq!(update.stage, PipelineStage::Filtering);
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.325).abs() < 1e-6);
        assert!(update.rows_removed.is_none());
    }

    #[test]
    fn test_progress_update_for_step() {
        let report = FilterReport {
            rule: "zero_gpa".to_string(),
            reason: "GPA not provided".to_string(),
            action: RuleAction::Removal,
            rows_before: 12,
            removed: 2,
            corrected: 0,
        };
        let update = ProgressUpdate::for_step(PipelineStage::Filtering, 4, 8, &report);

        assert_eq!(update.rule.as_deref(), Some("zero_gpa"));
        assert_eq!(update.rows_removed, Some(2));
        assert_eq!(update.rows_remaining, Some(10));
        assert_eq!(update.message, "2 rows removed for GPA not provided");
        assert_eq!(update.stage_progress, 0.5);
    }

    #[test]
    fn test_progress_update_terminal_states() {
        let done = ProgressUpdate::complete("Done");
        assert_eq!(done.stage, PipelineStage::Complete);
        assert_eq!(done.progress, 1.0);

        let failed = ProgressUpdate::failed("boom");
        assert_eq!(failed.stage, PipelineStage::Failed);
        assert_eq!(failed.progress, 0.0);
    }

    #[test]
    fn test_closure_progress_reporter() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let reporter = ClosureProgressReporter::new(move |_update| {
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        reporter.report(ProgressUpdate::new(PipelineStage::Classifying, 0.5, "Test"));
        reporter.report(ProgressUpdate::complete("Done"));

        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stage_weights_sum() {
        let stages = [
            PipelineStage::Normalizing,
            PipelineStage::Filtering,
            PipelineStage::Deduplicating,
            PipelineStage::Classifying,
            PipelineStage::Aggregating,
        ];

        let total_weight: f32 = stages.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        let stages = [
            PipelineStage::Normalizing,
            PipelineStage::Filtering,
            PipelineStage::Deduplicating,
            PipelineStage::Classifying,
            PipelineStage::Aggregating,
            PipelineStage::Complete,
        ];
        for pair in stages.windows(2) {
            let expected = pair[0].base_progress() + pair[0].weight();
            assert!((pair[1].base_progress() - expected).abs() < 1e-6);
        }
    }
}
