//! Grade and honors classification.
//!
//! Classification is a pure function of `(gpa, duration_semesters)`. Both
//! tables are evaluated top to bottom and the first matching row wins; the
//! honors table is not ordered purely by GPA because the top two rows are also
//! gated on duration.

use crate::cleaner::{float_values, int_values};
use crate::error::Result;
use crate::types::{Classification, Grade, HonorsPredicate, columns};
use polars::prelude::*;
use tracing::info;

/// Semester boundary used when no configuration is supplied.
pub const DEFAULT_CYCLE_BOUNDARY: i64 = 8;

/// Lower GPA bound of a grade band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub min_gpa: f64,
    pub grade: Grade,
}

/// Grade bands, highest first. GPAs below the last band get [`Grade::D`].
pub const GRADE_BANDS: [GradeBand; 4] = [
    GradeBand { min_gpa: 3.75, grade: Grade::A },
    GradeBand { min_gpa: 3.50, grade: Grade::BPlus },
    GradeBand { min_gpa: 3.00, grade: Grade::B },
    GradeBand { min_gpa: 2.50, grade: Grade::C },
];

/// One row of the honors table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HonorsRule {
    pub min_gpa: f64,
    /// Inclusive duration cap. A missing duration never passes a cap.
    pub max_duration: Option<i64>,
    pub predicate: HonorsPredicate,
}

impl HonorsRule {
    fn matches(&self, gpa: f64, duration: Option<i64>) -> bool {
        gpa >= self.min_gpa
            && match self.max_duration {
                Some(cap) => duration.is_some_and(|d| d <= cap),
                None => true,
            }
    }
}

/// Evaluates the grade and honors tables for one cycle boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    honors_rules: [HonorsRule; 3],
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_CYCLE_BOUNDARY)
    }
}

impl Classifier {
    /// Cumlaude requires finishing within `boundary` semesters, Sangat
    /// Memuaskan within one semester more.
    pub fn new(boundary: i64) -> Self {
        Self {
            honors_rules: [
                HonorsRule {
                    min_gpa: 3.75,
                    max_duration: Some(boundary),
                    predicate: HonorsPredicate::Cumlaude,
                },
                HonorsRule {
                    min_gpa: 3.50,
                    max_duration: Some(boundary.saturating_add(1)),
                    predicate: HonorsPredicate::SangatMemuaskan,
                },
                HonorsRule {
                    min_gpa: 3.00,
                    max_duration: None,
                    predicate: HonorsPredicate::Memuaskan,
                },
            ],
        }
    }

    pub fn honors_rules(&self) -> &[HonorsRule] {
        &self.honors_rules
    }

    pub fn grade(&self, gpa: f64) -> Grade {
        GRADE_BANDS
            .iter()
            .find(|band| gpa >= band.min_gpa)
            .map_or(Grade::D, |band| band.grade)
    }

    pub fn honors(&self, gpa: f64, duration: Option<i64>) -> HonorsPredicate {
        self.honors_rules
            .iter()
            .find(|rule| rule.matches(gpa, duration))
            .map_or(HonorsPredicate::Cukup, |rule| rule.predicate)
    }

    pub fn classify(&self, gpa: f64, duration: Option<i64>) -> Classification {
        Classification {
            grade: self.grade(gpa),
            honors: self.honors(gpa, duration),
        }
    }

    /// Append `grade` and `honors_predicate` columns computed from `gpa` and
    /// `duration_semesters`.
    pub fn attach(&self, df: &DataFrame) -> Result<DataFrame> {
        let gpas = float_values(df, columns::GPA)?;
        let durations = int_values(df, columns::DURATION)?;

        let classifications: Vec<Option<Classification>> = gpas
            .iter()
            .zip(durations)
            .map(|(gpa, duration)| gpa.map(|g| self.classify(g, duration)))
            .collect();

        let grades: Vec<Option<&str>> = classifications
            .iter()
            .map(|c| c.map(|c| c.grade.as_str()))
            .collect();
        let honors: Vec<Option<&str>> = classifications
            .iter()
            .map(|c| c.map(|c| c.honors.as_str()))
            .collect();

        let mut table = df.clone();
        table.with_column(Series::new(columns::GRADE.into(), grades))?;
        table.with_column(Series::new(columns::HONORS.into(), honors))?;

        info!("Classified {} records", table.height());
        Ok(table)
    }
}

/// Classify with the default cycle boundary of eight semesters.
pub fn classify(gpa: f64, duration: Option<i64>) -> Classification {
    Classifier::default().classify(gpa, duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::test_support::{Row, roster_frame};
    use crate::cleaner::text_values;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duration_gate_falls_through_to_next_rule() {
        let c = classify(3.8, Some(9));
        assert_eq!(c.grade, Grade::A);
        assert_eq!(c.honors, HonorsPredicate::SangatMemuaskan);
    }

    #[test]
    fn test_cumlaude_at_boundary() {
        let c = classify(3.75, Some(8));
        assert_eq!(c.grade, Grade::A);
        assert_eq!(c.honors, HonorsPredicate::Cumlaude);
    }

    #[test]
    fn test_lowest_bands() {
        let c = classify(2.0, Some(6));
        assert_eq!(c.grade, Grade::D);
        assert_eq!(c.honors, HonorsPredicate::Cukup);
    }

    #[test]
    fn test_grade_band_edges() {
        let c = Classifier::default();
        assert_eq!(c.grade(3.7499), Grade::BPlus);
        assert_eq!(c.grade(3.50), Grade::BPlus);
        assert_eq!(c.grade(3.00), Grade::B);
        assert_eq!(c.grade(2.50), Grade::C);
        assert_eq!(c.grade(2.49), Grade::D);
        assert_eq!(c.grade(4.0), Grade::A);
    }

    #[test]
    fn test_high_gpa_slow_graduate_gets_memuaskan() {
        assert_eq!(classify(3.9, Some(10)).honors, HonorsPredicate::Memuaskan);
        assert_eq!(classify(3.6, Some(10)).honors, HonorsPredicate::Memuaskan);
    }

    #[test]
    fn test_missing_duration_never_passes_gate() {
        assert_eq!(classify(3.95, None).honors, HonorsPredicate::Memuaskan);
        assert_eq!(classify(3.95, None).grade, Grade::A);
        assert_eq!(classify(2.9, None).honors, HonorsPredicate::Cukup);
    }

    #[test]
    fn test_custom_boundary() {
        let c = Classifier::new(10);
        assert_eq!(c.honors(3.8, Some(10)), HonorsPredicate::Cumlaude);
        assert_eq!(c.honors(3.8, Some(11)), HonorsPredicate::SangatMemuaskan);
    }

    #[test]
    fn test_unbounded_cycle_boundary() {
        let c = Classifier::new(i64::MAX);
        assert_eq!(c.honors(3.8, Some(i64::MAX)), HonorsPredicate::Cumlaude);
        assert_eq!(c.honors_rules()[1].max_duration, Some(i64::MAX));
    }

    #[test]
    fn test_attach_adds_columns() {
        let df = roster_frame(&[
            Row::new("1", "A", Some("TPPL"), Some(3.8), Some(9)),
            Row::new("2", "B", Some("TPPL"), Some(3.75), Some(8)),
            Row::new("3", "C", Some("TPPL"), Some(2.0), Some(6)),
        ]);

        let table = Classifier::default().attach(&df).unwrap();
        assert_eq!(
            text_values(&table, columns::GRADE).unwrap(),
            vec![Some("A".to_string()), Some("A".to_string()), Some("D".to_string())]
        );
        assert_eq!(
            text_values(&table, columns::HONORS).unwrap(),
            vec![
                Some("Sangat Memuaskan".to_string()),
                Some("Cumlaude".to_string()),
                Some("Cukup".to_string())
            ]
        );
    }
}
