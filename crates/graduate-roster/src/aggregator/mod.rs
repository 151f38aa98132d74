//! Per-program statistics over the cleaned roster.
//!
//! Programs are always listed in the order they first appear in the table,
//! which also decides ties for the Cumlaude leader.

use crate::cleaner::{float_values, text_values};
use crate::error::Result;
use crate::types::{CumlaudeLeader, HonorsPredicate, ProgramMean, columns};
use polars::prelude::*;
use tracing::{debug, info};

const GRADUATES: &str = "graduates";
const CUMLAUDE_COUNT: &str = "cumlaude_count";

/// Result of aggregating a classified roster.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Input table with `program_mean_gpa` broadcast to every row.
    pub table: DataFrame,
    /// Compact `program` -> `program_mean_gpa` table.
    pub summary: DataFrame,
    pub program_means: Vec<ProgramMean>,
    pub honors_counts: Vec<(HonorsPredicate, usize)>,
    pub cumlaude_leader: Option<CumlaudeLeader>,
}

/// Values of a count column (`len()` / boolean sums) as `usize`.
fn count_values(df: &DataFrame, name: &str) -> Result<Vec<usize>> {
    let counts = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::UInt64)?;
    Ok(counts
        .u64()?
        .into_iter()
        .map(|c| c.unwrap_or(0) as usize)
        .collect())
}

/// Group by program in first-appearance order with the rounded mean GPA
/// and the number of graduates behind it.
pub fn program_summary(df: &DataFrame) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .filter(
            col(columns::PROGRAM)
                .is_not_null()
                .and(col(columns::GPA).is_not_null()),
        )
        .group_by_stable([col(columns::PROGRAM)])
        .agg([
            col(columns::GPA)
                .mean()
                .round(2, RoundMode::HalfAwayFromZero)
                .alias(columns::PROGRAM_MEAN_GPA),
            len().alias(GRADUATES),
        ])
        .collect()?)
}

fn means_from_summary(summary: &DataFrame) -> Result<Vec<ProgramMean>> {
    let programs = text_values(summary, columns::PROGRAM)?;
    let means = float_values(summary, columns::PROGRAM_MEAN_GPA)?;
    let graduates = count_values(summary, GRADUATES)?;

    Ok(programs
        .into_iter()
        .zip(means)
        .zip(graduates)
        .filter_map(|((program, mean), graduates)| {
            Some(ProgramMean {
                program: program?,
                mean_gpa: mean?,
                graduates,
            })
        })
        .collect())
}

/// Mean GPA per program, rounded to two decimals, in first-appearance order.
pub fn program_means(df: &DataFrame) -> Result<Vec<ProgramMean>> {
    means_from_summary(&program_summary(df)?)
}

/// Number of records per honors predicate, highest predicate first.
pub fn honors_counts(df: &DataFrame) -> Result<Vec<(HonorsPredicate, usize)>> {
    let honors = df
        .column(columns::HONORS)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let honors = honors.str()?;

    Ok(HonorsPredicate::ALL
        .iter()
        .map(|predicate| {
            let count = honors.equal(predicate.as_str()).sum().unwrap_or(0);
            (*predicate, count as usize)
        })
        .collect())
}

/// Program with the most Cumlaude records. Ties go to the program that
/// appears first in the table; `None` when nobody graduated Cumlaude.
pub fn cumlaude_leader(df: &DataFrame) -> Result<Option<CumlaudeLeader>> {
    let counts = df
        .clone()
        .lazy()
        .filter(col(columns::PROGRAM).is_not_null())
        .group_by_stable([col(columns::PROGRAM)])
        .agg([col(columns::HONORS)
            .eq(lit(HonorsPredicate::Cumlaude.as_str()))
            .cast(DataType::UInt32)
            .sum()
            .alias(CUMLAUDE_COUNT)])
        .collect()?;

    let programs = text_values(&counts, columns::PROGRAM)?;
    let cumlaude = count_values(&counts, CUMLAUDE_COUNT)?;

    // Strictly greater keeps the earliest program on ties.
    let leader = programs
        .into_iter()
        .zip(cumlaude)
        .filter(|(_, count)| *count > 0)
        .fold(None, |best: Option<(Option<String>, usize)>, (program, count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((program, count)),
        });

    Ok(leader.and_then(|(program, count)| {
        program.map(|program| CumlaudeLeader { program, count })
    }))
}

/// Broadcast the program means onto every row as `program_mean_gpa`.
///
/// Left join on `program`, keeping the row order of `df`.
pub fn attach_program_mean(df: &DataFrame, summary: &DataFrame) -> Result<DataFrame> {
    let means = summary
        .clone()
        .lazy()
        .select([col(columns::PROGRAM), col(columns::PROGRAM_MEAN_GPA)]);

    Ok(df
        .clone()
        .lazy()
        .join(
            means,
            [col(columns::PROGRAM)],
            [col(columns::PROGRAM)],
            JoinArgs {
                maintain_order: MaintainOrderJoin::Left,
                ..JoinArgs::new(JoinType::Left)
            },
        )
        .collect()?)
}

/// The compact program summary table with its `program` label column.
pub fn summary_table(summary: &DataFrame) -> Result<DataFrame> {
    Ok(summary.select([columns::PROGRAM, columns::PROGRAM_MEAN_GPA])?)
}

/// Run every aggregation over a classified table.
pub fn aggregate(df: &DataFrame) -> Result<Aggregation> {
    let grouped = program_summary(df)?;
    let program_means = means_from_summary(&grouped)?;
    let table = attach_program_mean(df, &grouped)?;
    let summary = summary_table(&grouped)?;
    let honors_counts = honors_counts(df)?;
    let cumlaude_leader = cumlaude_leader(df)?;

    debug!("Program means: {:?}", program_means);
    info!(
        "Aggregated {} programs over {} records",
        program_means.len(),
        df.height()
    );

    Ok(Aggregation {
        table,
        summary,
        program_means,
        honors_counts,
        cumlaude_leader,
    })
}
