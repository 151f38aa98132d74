//! Main roster pipeline.
//!
//! The pipeline owns the table for the whole run and moves it through the
//! stages strictly in sequence: normalize, clean, deduplicate, classify,
//! aggregate. Nothing is written to disk here.

use crate::aggregator;
use crate::classifier::Classifier;
use crate::cleaner::{FilterChain, deduplicate, normalize};
use crate::config::{ConfigValidationError, PipelineConfig};
use crate::error::{Result, ResultExt};
use crate::pipeline::progress::{
    ClosureProgressReporter, PipelineStage, ProgressReporter, ProgressUpdate,
};
use crate::types::{PipelineResult, RosterSummary, columns};
use polars::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The graduate roster pipeline.
///
/// Use [`Pipeline::builder()`] to create a pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use graduate_roster::{Pipeline, PipelineConfig};
///
/// let result = Pipeline::builder()
///     .config(PipelineConfig::builder().graduation_year(2024).build()?)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .build()?
///     .process(dataframe)?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    filters: FilterChain,
    classifier: Classifier,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a raw roster table through every stage.
    ///
    /// # Errors
    ///
    /// Fails when the GPA or duration column cannot be located, or when a
    /// table operation fails. Malformed field values are never errors.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.process_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Pipeline completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let mut summary = RosterSummary::new();
        summary.rows_before = df.height();

        info!("Starting roster pipeline on {} rows...", df.height());

        // Step 1: Normalize headers and fields
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Normalizing,
            0.0,
            "Normalizing headers and fields...",
        ));
        let table = normalize(&df, &self.config.columns).context("Normalization failed")?;

        // Step 2: Ordered cleaning rules
        let total_rules = self.filters.rules().len();
        let mut step = 0;
        let (table, mut filter_reports) =
            self.filters.run(table, &self.config, |report| {
                step += 1;
                self.report_progress(ProgressUpdate::for_step(
                    PipelineStage::Filtering,
                    step,
                    total_rules,
                    report,
                ));
            })?;

        // Step 3: Duplicate keys, after corrections have been applied
        let (table, dedup_report) = deduplicate(&table)?;
        self.report_progress(ProgressUpdate::for_step(
            PipelineStage::Deduplicating,
            1,
            1,
            &dedup_report,
        ));
        filter_reports.push(dedup_report);

        if table.height() == 0 {
            warn!("No records survived cleaning");
            summary.add_warning("No records survived cleaning");
        }

        // Step 4: Grade and honors predicate
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Classifying,
            0.0,
            "Classifying graduates...",
        ));
        let table = self.classifier.attach(&table)?;

        // Step 5: Program statistics
        self.report_progress(ProgressUpdate::new(
            PipelineStage::Aggregating,
            0.0,
            "Aggregating program statistics...",
        ));
        let aggregation = aggregator::aggregate(&table)?;

        let cleaned = self.finalize(aggregation.table)?;

        summary.rows_after = cleaned.height();
        summary.rows_removed = filter_reports.iter().map(|r| r.removed).sum();
        summary.values_corrected = filter_reports.iter().map(|r| r.corrected).sum();
        summary.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            "Pipeline complete: {} -> {} rows ({:.1}% removed) in {}ms",
            summary.rows_before,
            summary.rows_after,
            summary.rows_removed_percentage(),
            summary.duration_ms
        );

        Ok(PipelineResult {
            cleaned,
            program_summary: aggregation.summary,
            filter_reports,
            program_means: aggregation.program_means,
            honors_counts: aggregation.honors_counts,
            cumlaude_leader: aggregation.cumlaude_leader,
            summary,
        })
    }

    /// Stamp the graduation year and put the columns in output order.
    fn finalize(&self, mut table: DataFrame) -> Result<DataFrame> {
        let years = vec![self.config.graduation_year; table.height()];
        table.with_column(Series::new(columns::GRADUATION_YEAR.into(), years))?;

        let mut order = vec![
            columns::ID,
            columns::NAME,
            columns::PROGRAM,
            columns::GPA,
            columns::DURATION,
            columns::GRADE,
            columns::HONORS,
        ];
        if self.config.include_program_mean {
            order.push(columns::PROGRAM_MEAN_GPA);
        }
        order.push(columns::GRADUATION_YEAR);

        Ok(table.select(order)?)
    }
}

/// Builder for creating a [`Pipeline`] with custom configuration.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a closure to receive progress updates.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(Pipeline {
            classifier: Classifier::new(config.cycle_boundary_semesters),
            filters: FilterChain::standard(),
            progress_reporter: self.progress_reporter,
            config,
        })
    }
}
