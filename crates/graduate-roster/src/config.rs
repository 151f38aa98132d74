//! Configuration types for the roster pipeline.
//!
//! Every token, bound and column alias the cleaning rules depend on lives
//! here as data, so the rules can be audited and tested in isolation. Use
//! [`PipelineConfig::builder()`] for a validated configuration.

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

/// An exact-match program code correction (e.g. `TPPLL` → `TPPL`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCorrection {
    /// The misspelled program value.
    pub from: String,
    /// The canonical program value it is rewritten to.
    pub to: String,
}

impl ProgramCorrection {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Header aliases used to locate the input columns.
///
/// Aliases are compared against *normalized* headers (trimmed, lower-cased,
/// internal whitespace collapsed). The id, name, program and GPA aliases must
/// match a header exactly; duration phrases only need to be contained in one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnAliases {
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub program: Vec<String>,
    pub gpa: Vec<String>,
    pub duration_phrases: Vec<String>,
}

impl Default for ColumnAliases {
    fn default() -> Self {
        fn owned(values: &[&str]) -> Vec<String> {
            values.iter().map(|s| s.to_string()).collect()
        }

        Self {
            id: owned(&["nim", "id", "student id"]),
            name: owned(&["nama mahasiswa", "name", "student name"]),
            program: owned(&["program studi", "program"]),
            gpa: owned(&["ipk", "gpa"]),
            duration_phrases: owned(&["lama studi", "duration"]),
        }
    }
}

/// Configuration for the roster pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Graduation year stamped on every cleaned record.
    /// Default: the current calendar year
    pub graduation_year: i32,

    /// Program tokens that disqualify a record (case-insensitive substring).
    /// Default: ["TRLP"]
    pub blocked_program_tokens: Vec<String>,

    /// Exact-match program corrections, applied in order.
    /// Default: TPPLL -> TPPL
    pub program_corrections: Vec<ProgramCorrection>,

    /// Tokens identifying short-cycle (D3) programs.
    /// Default: ["D3"]
    pub short_cycle_tokens: Vec<String>,

    /// Tokens identifying extended-cycle (D4) programs.
    /// Default: ["D4"]
    pub extended_cycle_tokens: Vec<String>,

    /// Semester count separating short-cycle from extended-cycle durations.
    /// Also the Cumlaude duration gate.
    /// Default: 8
    pub cycle_boundary_semesters: i64,

    /// Smallest plausible study duration; shorter values become missing.
    /// Default: 4
    pub min_duration_semesters: i64,

    /// Largest plausible study duration; longer values become missing.
    /// Default: 14
    pub max_duration_semesters: i64,

    /// Inclusive upper bound for GPA. The lower bound is always exclusive 0.0.
    /// Default: 4.0
    pub max_gpa: f64,

    /// Header aliases used to locate input columns.
    pub columns: ColumnAliases,

    /// Whether the cleaned table carries the `program_mean_gpa` column.
    /// Default: true
    pub include_program_mean: bool,

    /// Whether the per-program summary table is written next to the output.
    /// Default: true
    pub write_program_summary: bool,

    /// Number of cleaned rows shown in the console preview.
    /// Default: 10
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            graduation_year: Local::now().year(),
            blocked_program_tokens: vec!["TRLP".to_string()],
            program_corrections: vec![ProgramCorrection::new("TPPLL", "TPPL")],
            short_cycle_tokens: vec!["D3".to_string()],
            extended_cycle_tokens: vec!["D4".to_string()],
            cycle_boundary_semesters: 8,
            min_duration_semesters: 4,
            max_duration_semesters: 14,
            max_gpa: 4.0,
            columns: ColumnAliases::default(),
            include_program_mean: true,
            write_program_summary: true,
            preview_rows: 10,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let aliases = [
            ("id", &self.columns.id),
            ("name", &self.columns.name),
            ("program", &self.columns.program),
            ("gpa", &self.columns.gpa),
            ("duration", &self.columns.duration_phrases),
        ];
        for (field, values) in aliases {
            if values.iter().all(|v| v.trim().is_empty()) {
                return Err(ConfigValidationError::EmptyAliases(field.to_string()));
            }
        }

        if self.min_duration_semesters > self.max_duration_semesters {
            return Err(ConfigValidationError::InvalidDurationBounds {
                min: self.min_duration_semesters,
                max: self.max_duration_semesters,
            });
        }

        if !(self.min_duration_semesters..=self.max_duration_semesters)
            .contains(&self.cycle_boundary_semesters)
        {
            return Err(ConfigValidationError::InvalidCycleBoundary(
                self.cycle_boundary_semesters,
            ));
        }

        if !(self.max_gpa > 0.0) {
            return Err(ConfigValidationError::InvalidMaxGpa(self.max_gpa));
        }

        if let Some(bad) = self
            .program_corrections
            .iter()
            .find(|c| c.from.is_empty() || c.to.trim().is_empty())
        {
            return Err(ConfigValidationError::EmptyCorrection(format!(
                "'{}' -> '{}'",
                bad.from, bad.to
            )));
        }

        if self.preview_rows == 0 {
            return Err(ConfigValidationError::InvalidPreviewRows);
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("No aliases configured for the '{0}' column")]
    EmptyAliases(String),

    #[error("Invalid duration bounds: min {min} is greater than max {max}")]
    InvalidDurationBounds { min: i64, max: i64 },

    #[error("Invalid cycle boundary: {0} (must lie within the duration bounds)")]
    InvalidCycleBoundary(i64),

    #[error("Invalid max GPA: {0} (must be positive)")]
    InvalidMaxGpa(f64),

    #[error("Invalid program correction {0} (source and target must be non-empty)")]
    EmptyCorrection(String),

    #[error("Preview rows must be at least 1")]
    InvalidPreviewRows,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    graduation_year: Option<i32>,
    blocked_program_tokens: Option<Vec<String>>,
    program_corrections: Option<Vec<ProgramCorrection>>,
    short_cycle_tokens: Option<Vec<String>>,
    extended_cycle_tokens: Option<Vec<String>>,
    cycle_boundary_semesters: Option<i64>,
    duration_bounds: Option<(i64, i64)>,
    max_gpa: Option<f64>,
    columns: Option<ColumnAliases>,
    include_program_mean: Option<bool>,
    write_program_summary: Option<bool>,
    preview_rows: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Set the graduation year stamped on every record.
    pub fn graduation_year(mut self, year: i32) -> Self {
        self.graduation_year = Some(year);
        self
    }

    /// Replace the blocked program tokens.
    pub fn blocked_program_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocked_program_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Add an exact-match program correction.
    pub fn program_correction(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.program_corrections
            .get_or_insert_with(Vec::new)
            .push(ProgramCorrection::new(from, to));
        self
    }

    /// Replace the short-cycle program tokens.
    pub fn short_cycle_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.short_cycle_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the extended-cycle program tokens.
    pub fn extended_cycle_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extended_cycle_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Set the short/extended cycle boundary in semesters.
    pub fn cycle_boundary_semesters(mut self, semesters: i64) -> Self {
        self.cycle_boundary_semesters = Some(semesters);
        self
    }

    /// Set the plausible duration range (inclusive).
    pub fn duration_bounds(mut self, min: i64, max: i64) -> Self {
        self.duration_bounds = Some((min, max));
        self
    }

    /// Set the inclusive GPA upper bound.
    pub fn max_gpa(mut self, max_gpa: f64) -> Self {
        self.max_gpa = Some(max_gpa);
        self
    }

    /// Replace the column aliases.
    pub fn columns(mut self, columns: ColumnAliases) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Include or omit the `program_mean_gpa` output column.
    pub fn include_program_mean(mut self, include: bool) -> Self {
        self.include_program_mean = Some(include);
        self
    }

    /// Write or skip the per-program summary table.
    pub fn write_program_summary(mut self, write: bool) -> Self {
        self.write_program_summary = Some(write);
        self
    }

    /// Set the number of rows shown in the console preview.
    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = Some(rows);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let (min_duration, max_duration) = self.duration_bounds.unwrap_or((
            defaults.min_duration_semesters,
            defaults.max_duration_semesters,
        ));

        let config = PipelineConfig {
            graduation_year: self.graduation_year.unwrap_or(defaults.graduation_year),
            blocked_program_tokens: self
                .blocked_program_tokens
                .unwrap_or(defaults.blocked_program_tokens),
            program_corrections: self
                .program_corrections
                .unwrap_or(defaults.program_corrections),
            short_cycle_tokens: self.short_cycle_tokens.unwrap_or(defaults.short_cycle_tokens),
            extended_cycle_tokens: self
                .extended_cycle_tokens
                .unwrap_or(defaults.extended_cycle_tokens),
            cycle_boundary_semesters: self
                .cycle_boundary_semesters
                .unwrap_or(defaults.cycle_boundary_semesters),
            min_duration_semesters: min_duration,
            max_duration_semesters: max_duration,
            max_gpa: self.max_gpa.unwrap_or(defaults.max_gpa),
            columns: self.columns.unwrap_or(defaults.columns),
            include_program_mean: self
                .include_program_mean
                .unwrap_or(defaults.include_program_mean),
            write_program_summary: self
                .write_program_summary
                .unwrap_or(defaults.write_program_summary),
            preview_rows: self.preview_rows.unwrap_or(defaults.preview_rows),
        };

        config.validate()?;
        Ok(config)
    }
}
