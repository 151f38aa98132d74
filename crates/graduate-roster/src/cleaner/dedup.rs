//! Keep-first duplicate removal on the `(id, name)` identity key.

use crate::error::Result;
use crate::types::{FilterReport, RuleAction, columns};
use polars::prelude::*;
use tracing::{debug, info, warn};

const RULE_ID: &str = "duplicate_key";
const REASON: &str = "duplicate (id, name)";

/// Rows whose id or name is missing.
fn blank_key_rows(df: &DataFrame) -> Result<usize> {
    let ids = df.column(columns::ID)?.as_materialized_series().is_null();
    let names = df.column(columns::NAME)?.as_materialized_series().is_null();
    Ok((&ids | &names).sum().unwrap_or(0) as usize)
}

/// Remove every row whose `(id, name)` pair already appeared earlier.
///
/// Keys compare by exact value after normalization. Two missing ids (or
/// names) compare equal, so rows with blank keys can collapse into one; this
/// is logged but not prevented.
pub fn deduplicate(df: &DataFrame) -> Result<(DataFrame, FilterReport)> {
    let rows_before = df.height();
    let key = [columns::ID.to_string(), columns::NAME.to_string()];
    let table = df.unique_stable(Some(key.as_slice()), UniqueKeepStrategy::First, None)?;

    let blank_key_collisions = blank_key_rows(df)? - blank_key_rows(&table)?;
    if blank_key_collisions > 0 {
        warn!(
            "{} duplicate rows share a key with a missing id or name; they were merged",
            blank_key_collisions
        );
    }

    let report = FilterReport {
        rule: RULE_ID.to_string(),
        reason: REASON.to_string(),
        action: RuleAction::Removal,
        rows_before,
        removed: rows_before - table.height(),
        corrected: 0,
    };

    if report.removed > 0 {
        info!("{}", report.console_line());
    } else {
        debug!("No duplicate keys found");
    }

    Ok((table, report))
}
