use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Canonical column names
// ============================================================================

/// Canonical column names of the cleaned table, in output order.
pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const PROGRAM: &str = "program";
    pub const GPA: &str = "gpa";
    pub const DURATION: &str = "duration_semesters";
    pub const GRADE: &str = "grade";
    pub const HONORS: &str = "honors_predicate";
    pub const PROGRAM_MEAN_GPA: &str = "program_mean_gpa";
    pub const GRADUATION_YEAR: &str = "graduation_year";
}

// ============================================================================
// Classification
// ============================================================================

/// Letter grade derived from GPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    C,
    D,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Graduation honors predicate (predikat kelulusan).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HonorsPredicate {
    Cumlaude,
    #[serde(rename = "Sangat Memuaskan")]
    SangatMemuaskan,
    Memuaskan,
    Cukup,
}

impl HonorsPredicate {
    /// All predicates, highest first.
    pub const ALL: [HonorsPredicate; 4] = [
        Self::Cumlaude,
        Self::SangatMemuaskan,
        Self::Memuaskan,
        Self::Cukup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cumlaude => "Cumlaude",
            Self::SangatMemuaskan => "Sangat Memuaskan",
            Self::Memuaskan => "Memuaskan",
            Self::Cukup => "Cukup",
        }
    }

    /// English gloss of the predicate.
    pub fn english(&self) -> &'static str {
        match self {
            Self::Cumlaude => "With Honors",
            Self::SangatMemuaskan => "Very Satisfactory",
            Self::Memuaskan => "Satisfactory",
            Self::Cukup => "Adequate",
        }
    }
}

impl fmt::Display for HonorsPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the classifier for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub grade: Grade,
    pub honors: HonorsPredicate,
}

// ============================================================================
// Filter chain reporting
// ============================================================================

/// Whether a cleaning rule drops rows or rewrites values in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Removal,
    Correction,
}

/// Outcome of one cleaning rule, in execution order.
///
/// `removed` is always the before-count minus the after-count of the table.
/// Correction rules never remove rows and report `corrected` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterReport {
    /// Stable rule identifier (e.g. `"blocked_program"`).
    pub rule: String,
    /// Human-readable reason used in the console line.
    pub reason: String,
    pub action: RuleAction,
    pub rows_before: usize,
    pub removed: usize,
    pub corrected: usize,
}

impl FilterReport {
    pub fn rows_after(&self) -> usize {
        self.rows_before - self.removed
    }

    /// Console line for this rule, e.g. `"3 rows removed for GPA not provided"`.
    pub fn console_line(&self) -> String {
        match self.action {
            RuleAction::Removal => format!("{} rows removed for {}", self.removed, self.reason),
            RuleAction::Correction => {
                format!("{} rows corrected for {}", self.corrected, self.reason)
            }
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Mean GPA of one program, rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramMean {
    pub program: String,
    pub mean_gpa: f64,
    pub graduates: usize,
}

/// The program with the most Cumlaude graduates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumlaudeLeader {
    pub program: String,
    pub count: usize,
}

impl CumlaudeLeader {
    /// Console line naming the leader, or the fallback message when absent.
    pub fn console_line(leader: Option<&CumlaudeLeader>) -> String {
        match leader {
            Some(l) => format!(
                "Program with the most Cumlaude graduates: {} ({} graduates)",
                l.program, l.count
            ),
            None => "No Cumlaude graduates found".to_string(),
        }
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Row accounting for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSummary {
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub rows_removed: usize,
    pub values_corrected: usize,
    pub warnings: Vec<String>,
}

impl RosterSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn rows_removed_percentage(&self) -> f32 {
        if self.rows_before == 0 {
            0.0
        } else {
            (self.rows_removed as f32 / self.rows_before as f32) * 100.0
        }
    }
}

/// Everything a pipeline run produces. Nothing here has been written to disk.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Cleaned and classified table in output column order.
    pub cleaned: DataFrame,
    /// Compact program -> mean GPA table.
    pub program_summary: DataFrame,
    /// One entry per cleaning rule plus the deduplicator, in execution order.
    pub filter_reports: Vec<FilterReport>,
    pub program_means: Vec<ProgramMean>,
    pub honors_counts: Vec<(HonorsPredicate, usize)>,
    pub cumlaude_leader: Option<CumlaudeLeader>,
    pub summary: RosterSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_serialization() {
        assert_eq!(serde_json::to_string(&Grade::BPlus).unwrap(), "\"B+\"");
        assert_eq!(Grade::BPlus.to_string(), "B+");
    }

    #[test]
    fn test_honors_serialization() {
        assert_eq!(
            serde_json::to_string(&HonorsPredicate::SangatMemuaskan).unwrap(),
            "\"Sangat Memuaskan\""
        );
        assert_eq!(HonorsPredicate::Cukup.english(), "Adequate");
    }

    #[test]
    fn test_filter_report_console_line() {
        let removed = FilterReport {
            rule: "zero_gpa".to_string(),
            reason: "GPA not provided".to_string(),
            action: RuleAction::Removal,
            rows_before: 10,
            removed: 3,
            corrected: 0,
        };
        assert_eq!(removed.console_line(), "3 rows removed for GPA not provided");
        assert_eq!(removed.rows_after(), 7);

        let corrected = FilterReport {
            rule: "program_correction".to_string(),
            reason: "program typo".to_string(),
            action: RuleAction::Correction,
            rows_before: 7,
            removed: 0,
            corrected: 2,
        };
        assert_eq!(corrected.console_line(), "2 rows corrected for program typo");
        assert_eq!(corrected.rows_after(), 7);
    }

    #[test]
    fn test_cumlaude_leader_line() {
        let leader = CumlaudeLeader {
            program: "TPPL".to_string(),
            count: 4,
        };
        assert!(CumlaudeLeader::console_line(Some(&leader)).contains("TPPL (4 graduates)"));
        assert_eq!(
            CumlaudeLeader::console_line(None),
            "No Cumlaude graduates found"
        );
    }
}
