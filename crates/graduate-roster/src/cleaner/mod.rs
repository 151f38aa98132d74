//! Roster cleaning.
//!
//! This module provides:
//! - Header and field normalization ([`normalize`])
//! - The ordered cleaning rules ([`FilterChain`], [`FilterRule`])
//! - Keep-first duplicate removal on the `(id, name)` key ([`deduplicate`])

mod dedup;
mod filters;
mod normalizer;

pub use dedup::deduplicate;
pub use filters::{FilterChain, FilterRule};
pub use normalizer::{ResolvedColumns, normalize, resolve_columns};

use crate::error::Result;
use polars::prelude::*;

/// Values of a column as owned strings, casting non-string columns.
pub(crate) fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df.column(name)?.as_materialized_series();
    let series = if series.dtype() == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };

    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Values of a Float64 column.
pub(crate) fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .collect())
}

/// Values of an Int64 column.
pub(crate) fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .collect())
}

/// Keep the rows whose flag is `true`.
pub(crate) fn retain_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}
