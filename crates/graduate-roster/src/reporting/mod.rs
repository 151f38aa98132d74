//! Report generation module.
//!
//! This module writes the run artifacts and renders the console views:
//! - The cleaned roster and program summary tables (CSV)
//! - The JSON run report (`--json` / `--emit-report`)
//! - Terminal bar charts and the table preview
//!
//! # Example
//!
//! ```rust,ignore
//! use graduate_roster::reporting::{OutputPaths, ReportGenerator};
//!
//! let generator = ReportGenerator::new(OutputPaths::default_for_input(&input), &config);
//! let report = generator.build_run_report(&input, &result, &config, true);
//!
//! // Staged together: either every file appears or none does.
//! generator.write_artifacts(&result, Some(&report))?;
//! ```

pub mod chart;
mod generator;

pub use generator::{HonorsCount, OutputPaths, ReportGenerator, RunReport, console_preview};
