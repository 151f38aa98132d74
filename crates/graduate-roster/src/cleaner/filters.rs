//! Ordered cleaning rules.
//!
//! Each rule takes the table produced by the previous rule and returns the
//! next table together with a [`FilterReport`]. Later rules depend on the
//! corrections made by earlier ones, so the order in [`FilterRule::ORDERED`]
//! is fixed.

use super::{float_values, int_values, retain_rows, text_values};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::types::{FilterReport, RuleAction, columns};
use crate::utils::contains_any_token;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A single cleaning rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterRule {
    /// Drop rows without a program.
    MissingProgram,
    /// Drop rows whose program contains a blocked token.
    BlockedProgram,
    /// Rewrite known program misspellings to their canonical code.
    ProgramCorrection,
    /// Drop rows whose GPA is zero or was not provided.
    ZeroGpa,
    /// Drop rows whose GPA lies outside `(0, max_gpa]`.
    GpaOutOfRange,
    /// Clear durations outside the accepted semester range.
    DurationOutOfRange,
    /// Drop short-cycle rows that took longer than the cycle boundary.
    ShortCycleTooLong,
    /// Drop extended-cycle rows that finished before the cycle boundary.
    ExtendedCycleTooShort,
}

impl FilterRule {
    /// Execution order of the cleaning rules.
    pub const ORDERED: [FilterRule; 8] = [
        Self::MissingProgram,
        Self::BlockedProgram,
        Self::ProgramCorrection,
        Self::ZeroGpa,
        Self::GpaOutOfRange,
        Self::DurationOutOfRange,
        Self::ShortCycleTooLong,
        Self::ExtendedCycleTooShort,
    ];

    /// Stable identifier used in reports.
    pub fn id(&self) -> &'static str {
        match self {
            Self::MissingProgram => "missing_program",
            Self::BlockedProgram => "blocked_program",
            Self::ProgramCorrection => "program_correction",
            Self::ZeroGpa => "zero_gpa",
            Self::GpaOutOfRange => "gpa_out_of_range",
            Self::DurationOutOfRange => "duration_out_of_range",
            Self::ShortCycleTooLong => "short_cycle_too_long",
            Self::ExtendedCycleTooShort => "extended_cycle_too_short",
        }
    }

    pub fn action(&self) -> RuleAction {
        match self {
            Self::ProgramCorrection | Self::DurationOutOfRange => RuleAction::Correction,
            _ => RuleAction::Removal,
        }
    }

    /// Human-readable reason, filled in with the configured thresholds.
    pub fn reason(&self, config: &PipelineConfig) -> String {
        match self {
            Self::MissingProgram => "missing program".to_string(),
            Self::BlockedProgram => format!(
                "blocked program token ({})",
                config.blocked_program_tokens.join(", ")
            ),
            Self::ProgramCorrection => "program typo".to_string(),
            Self::ZeroGpa => "GPA not provided".to_string(),
            Self::GpaOutOfRange => format!("GPA outside (0, {}]", config.max_gpa),
            Self::DurationOutOfRange => format!(
                "duration outside [{}, {}] semesters",
                config.min_duration_semesters, config.max_duration_semesters
            ),
            Self::ShortCycleTooLong => format!(
                "{} program over {} semesters",
                config.short_cycle_tokens.join("/"),
                config.cycle_boundary_semesters
            ),
            Self::ExtendedCycleTooShort => format!(
                "{} program under {} semesters",
                config.extended_cycle_tokens.join("/"),
                config.cycle_boundary_semesters
            ),
        }
    }

    /// Apply this rule to a normalized roster table.
    pub fn apply(&self, df: &DataFrame, config: &PipelineConfig) -> Result<(DataFrame, FilterReport)> {
        let rows_before = df.height();

        let (table, corrected) = match self {
            Self::MissingProgram => {
                let programs = text_values(df, columns::PROGRAM)?;
                let keep: Vec<bool> = programs
                    .iter()
                    .map(|p| p.as_deref().is_some_and(|p| !p.trim().is_empty()))
                    .collect();
                (retain_rows(df, &keep)?, 0)
            }
            Self::BlockedProgram => {
                let programs = text_values(df, columns::PROGRAM)?;
                let keep: Vec<bool> = programs
                    .iter()
                    .map(|p| {
                        !p.as_deref()
                            .is_some_and(|p| contains_any_token(p, &config.blocked_program_tokens))
                    })
                    .collect();
                (retain_rows(df, &keep)?, 0)
            }
            Self::ProgramCorrection => correct_programs(df, config)?,
            Self::ZeroGpa => {
                // A missing GPA counts as not provided, same as an explicit zero.
                let gpas = float_values(df, columns::GPA)?;
                let keep: Vec<bool> = gpas.iter().map(|g| g.is_some_and(|g| g != 0.0)).collect();
                (retain_rows(df, &keep)?, 0)
            }
            Self::GpaOutOfRange => {
                let gpas = float_values(df, columns::GPA)?;
                let keep: Vec<bool> = gpas
                    .iter()
                    .map(|g| g.is_some_and(|g| g > 0.0 && g <= config.max_gpa))
                    .collect();
                (retain_rows(df, &keep)?, 0)
            }
            Self::DurationOutOfRange => clear_out_of_range_durations(df, config)?,
            Self::ShortCycleTooLong => {
                let boundary = config.cycle_boundary_semesters;
                let keep = cycle_mask(df, &config.short_cycle_tokens, |d| d > boundary)?;
                (retain_rows(df, &keep)?, 0)
            }
            Self::ExtendedCycleTooShort => {
                let boundary = config.cycle_boundary_semesters;
                let keep = cycle_mask(df, &config.extended_cycle_tokens, |d| d < boundary)?;
                (retain_rows(df, &keep)?, 0)
            }
        };

        let report = FilterReport {
            rule: self.id().to_string(),
            reason: self.reason(config),
            action: self.action(),
            rows_before,
            removed: rows_before - table.height(),
            corrected,
        };

        if report.removed > 0 || report.corrected > 0 {
            info!("{}", report.console_line());
        } else {
            debug!("Rule '{}' changed nothing", report.rule);
        }

        Ok((table, report))
    }
}

/// Keep-mask that drops rows whose program carries one of `tokens` and whose
/// duration satisfies `violates`. A missing duration never violates.
fn cycle_mask(df: &DataFrame, tokens: &[String], violates: impl Fn(i64) -> bool) -> Result<Vec<bool>> {
    let programs = text_values(df, columns::PROGRAM)?;
    let durations = int_values(df, columns::DURATION)?;

    Ok(programs
        .iter()
        .zip(durations)
        .map(|(program, duration)| {
            let in_track = program
                .as_deref()
                .is_some_and(|p| contains_any_token(p, tokens));
            !(in_track && duration.is_some_and(&violates))
        })
        .collect())
}

fn correct_programs(df: &DataFrame, config: &PipelineConfig) -> Result<(DataFrame, usize)> {
    let mut corrected = 0;
    let programs: Vec<Option<String>> = text_values(df, columns::PROGRAM)?
        .into_iter()
        .map(|program| {
            let replacement = program.as_deref().and_then(|p| {
                config
                    .program_corrections
                    .iter()
                    .find(|c| c.from == p)
                    .map(|c| c.to.clone())
            });
            match replacement {
                Some(to) => {
                    corrected += 1;
                    Some(to)
                }
                None => program,
            }
        })
        .collect();

    let mut table = df.clone();
    table.replace(columns::PROGRAM, Series::new(columns::PROGRAM.into(), programs))?;
    Ok((table, corrected))
}

fn clear_out_of_range_durations(df: &DataFrame, config: &PipelineConfig) -> Result<(DataFrame, usize)> {
    let range = config.min_duration_semesters..=config.max_duration_semesters;
    let mut cleared = 0;
    let durations: Vec<Option<i64>> = int_values(df, columns::DURATION)?
        .into_iter()
        .map(|duration| match duration {
            Some(d) if !range.contains(&d) => {
                cleared += 1;
                None
            }
            other => other,
        })
        .collect();

    let mut table = df.clone();
    table.replace(columns::DURATION, Series::new(columns::DURATION.into(), durations))?;
    Ok((table, cleared))
}

/// The ordered sequence of cleaning rules.
#[derive(Debug, Clone)]
pub struct FilterChain {
    rules: Vec<FilterRule>,
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl FilterChain {
    /// The full rule sequence in execution order.
    pub fn standard() -> Self {
        Self {
            rules: FilterRule::ORDERED.to_vec(),
        }
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    /// Fold the table through every rule, calling `on_step` after each one.
    pub fn run<F>(
        &self,
        df: DataFrame,
        config: &PipelineConfig,
        mut on_step: F,
    ) -> Result<(DataFrame, Vec<FilterReport>)>
    where
        F: FnMut(&FilterReport),
    {
        self.rules.iter().try_fold(
            (df, Vec::with_capacity(self.rules.len())),
            |(table, mut reports), rule| {
                let (next, report) = rule.apply(&table, config)?;
                on_step(&report);
                reports.push(report);
                Ok((next, reports))
            },
        )
    }
}
