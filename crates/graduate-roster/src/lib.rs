//! Graduate Roster Pipeline Library
//!
//! Validation, cleaning and honors classification for graduate rosters, built
//! on Polars.
//!
//! # Overview
//!
//! A roster moves through strictly sequential stages, each consuming the
//! table produced by the previous one:
//!
//! - **Normalization**: case/whitespace tolerant header matching, title-cased
//!   names, typed GPA and duration columns
//! - **Cleaning**: eight ordered rules that drop or correct records, each
//!   reporting exactly how many rows it removed
//! - **Deduplication**: keep-first on the `(id, name)` key
//! - **Classification**: grade and honors predicate from GPA and duration
//! - **Aggregation**: per-program mean GPA and the Cumlaude leader
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use graduate_roster::{Pipeline, PipelineConfig, load_roster};
//! use std::path::Path;
//!
//! let df = load_roster(Path::new("lulusan.csv"))?;
//!
//! let config = PipelineConfig::builder()
//!     .graduation_year(2024)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .process(df)?;
//!
//! for report in &result.filter_reports {
//!     println!("{}", report.console_line());
//! }
//! ```
//!
//! # Configuration
//!
//! Thresholds, token lists and column aliases live in [`PipelineConfig`] and
//! can also be loaded from JSON with [`PipelineConfig::from_json_file`]:
//!
//! ```rust,ignore
//! let config = PipelineConfig::builder()
//!     .blocked_program_tokens(["TRLP"])
//!     .program_correction("TPPLL", "TPPL")
//!     .duration_bounds(4, 14)
//!     .cycle_boundary_semesters(8)
//!     .build()?;
//! ```

pub mod aggregator;
pub mod classifier;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reporting;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use classifier::{Classifier, classify};
pub use cleaner::{FilterChain, FilterRule, deduplicate, normalize};
pub use config::{
    ColumnAliases, ConfigValidationError, PipelineConfig, PipelineConfigBuilder, ProgramCorrection,
};
pub use error::{Result as RosterResult, ResultExt, RosterError};
pub use loader::load_roster;
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PipelineStage, ProgressReporter,
    ProgressUpdate,
};
pub use reporting::{OutputPaths, ReportGenerator, RunReport};
pub use types::{
    Classification, CumlaudeLeader, FilterReport, Grade, HonorsPredicate, PipelineResult,
    ProgramMean, RosterSummary, RuleAction,
};
