//! Header and field normalization.
//!
//! Resolves the raw input columns to the canonical roster columns and parses
//! them into typed values. Malformed values become nulls; nothing here drops
//! rows.

use super::text_values;
use crate::config::ColumnAliases;
use crate::error::{Result, RosterError};
use crate::types::columns;
use crate::utils::{
    collapse_whitespace, is_missing_marker, normalize_header, parse_decimal, parse_semesters,
    title_case,
};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Raw header names resolved for each canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub id: Option<String>,
    pub name: Option<String>,
    pub program: Option<String>,
    pub gpa: String,
    pub duration: String,
}

/// Locate the roster columns in a raw header.
///
/// The id, name and program columns are optional: when absent their values
/// are treated as missing. GPA and duration are required because the
/// classifier cannot run without them.
pub fn resolve_columns(headers: &[String], aliases: &ColumnAliases) -> Result<ResolvedColumns> {
    let normalized: Vec<(String, &String)> = headers
        .iter()
        .map(|raw| (normalize_header(raw), raw))
        .collect();

    let exact = |candidates: &[String]| -> Option<String> {
        let wanted: Vec<String> = candidates.iter().map(|c| normalize_header(c)).collect();
        normalized
            .iter()
            .find(|(header, _)| wanted.iter().any(|w| !w.is_empty() && w == header))
            .map(|(_, raw)| (*raw).clone())
    };

    let gpa = exact(&aliases.gpa)
        .ok_or_else(|| RosterError::ColumnNotFound(aliases.gpa.join(" | ")))?;

    let phrases: Vec<String> = aliases
        .duration_phrases
        .iter()
        .map(|p| normalize_header(p))
        .filter(|p| !p.is_empty())
        .collect();
    let duration = normalized
        .iter()
        .find(|(header, _)| phrases.iter().any(|p| header.contains(p.as_str())))
        .map(|(_, raw)| (*raw).clone())
        .ok_or_else(|| RosterError::ColumnNotFound(aliases.duration_phrases.join(" | ")))?;

    let resolved = ResolvedColumns {
        id: exact(&aliases.id),
        name: exact(&aliases.name),
        program: exact(&aliases.program),
        gpa,
        duration,
    };

    for (role, found) in [
        ("id", &resolved.id),
        ("name", &resolved.name),
        ("program", &resolved.program),
    ] {
        if found.is_none() {
            warn!("No '{}' column found; its values are treated as missing", role);
        }
    }
    debug!("Resolved columns: {:?}", resolved);

    Ok(resolved)
}

/// Normalize a raw roster into the canonical typed table.
///
/// Output columns: `id`, `name`, `program` (String), `gpa` (Float64) and
/// `duration_semesters` (Int64). Names are trimmed and title-cased; blank
/// programs become null.
pub fn normalize(df: &DataFrame, aliases: &ColumnAliases) -> Result<DataFrame> {
    let headers: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let resolved = resolve_columns(&headers, aliases)?;
    let height = df.height();

    let optional_text = |raw: &Option<String>| -> Result<Vec<Option<String>>> {
        match raw {
            Some(name) => text_values(df, name),
            None => Ok(vec![None; height]),
        }
    };

    let ids: Vec<Option<String>> = optional_text(&resolved.id)?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .collect();

    let names: Vec<Option<String>> = optional_text(&resolved.name)?
        .into_iter()
        .map(|v| v.map(|s| title_case(s.trim())).filter(|s| !s.is_empty()))
        .collect();

    let programs: Vec<Option<String>> = optional_text(&resolved.program)?
        .into_iter()
        .map(|v| v.and_then(normalize_program))
        .collect();

    let raw_gpa = text_values(df, &resolved.gpa)?;
    let gpas: Vec<Option<f64>> = raw_gpa
        .iter()
        .map(|v| v.as_deref().and_then(parse_decimal))
        .collect();

    let raw_duration = text_values(df, &resolved.duration)?;
    let durations: Vec<Option<i64>> = raw_duration
        .iter()
        .map(|v| v.as_deref().and_then(parse_semesters))
        .collect();

    let malformed_gpa = count_malformed(&raw_gpa, &gpas);
    let malformed_duration = count_malformed(&raw_duration, &durations);
    if malformed_gpa > 0 || malformed_duration > 0 {
        info!(
            "Treated {} malformed GPA and {} malformed duration values as missing",
            malformed_gpa, malformed_duration
        );
    }

    let table = DataFrame::new(vec![
        Series::new(columns::ID.into(), ids).into(),
        Series::new(columns::NAME.into(), names).into(),
        Series::new(columns::PROGRAM.into(), programs).into(),
        Series::new(columns::GPA.into(), gpas).into(),
        Series::new(columns::DURATION.into(), durations).into(),
    ])?;

    Ok(table)
}

fn normalize_program(raw: String) -> Option<String> {
    let value = collapse_whitespace(&raw);
    if value.is_empty() || is_missing_marker(&value) {
        None
    } else {
        Some(value)
    }
}

/// Values present in the input that failed to parse.
fn count_malformed<T>(raw: &[Option<String>], parsed: &[Option<T>]) -> usize {
    raw.iter()
        .zip(parsed)
        .filter(|(r, p)| {
            p.is_none()
                && r.as_deref()
                    .is_some_and(|s| !s.trim().is_empty() && !is_missing_marker(s))
        })
        .count()
}
