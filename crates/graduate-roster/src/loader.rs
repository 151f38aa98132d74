//! Roster loading.
//!
//! Every column is read as text. Numeric parsing belongs to the normalizer so
//! that a malformed GPA or duration becomes a missing value instead of a
//! failed read.

use crate::error::{Result, RosterError};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, info};

/// Load a roster CSV from disk.
///
/// Tries a standard quoted read, then a read without quote handling, then a
/// read of pre-cleaned content.
///
/// # Errors
///
/// [`RosterError::InputNotFound`] when the path does not exist, and
/// [`RosterError::EmptyInput`] when the file has no columns.
pub fn load_roster(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(RosterError::InputNotFound(path.to_path_buf()));
    }

    info!("Loading roster from: {}", path.display());
    let df = read_with_fallbacks(path)?;

    if df.width() == 0 {
        return Err(RosterError::EmptyInput(path.display().to_string()));
    }

    info!("Roster loaded: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

fn text_options() -> CsvReadOptions {
    // A zero-length schema inference reads every column as String.
    CsvReadOptions::default()
        .with_infer_schema_length(Some(0))
        .with_has_header(true)
}

fn read_with_fallbacks(path: &Path) -> Result<DataFrame> {
    match text_options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Standard loading failed: {}", e),
    }

    match text_options()
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => debug!("Loading without quotes failed: {}", e),
    }

    let content = std::fs::read_to_string(path)?;
    let cleaned = clean_csv_content(&content);
    text_options()
        .into_reader_with_file_handle(Cursor::new(cleaned))
        .finish()
        .map_err(RosterError::from)
}

/// Collapse doubled quote artifacts and drop blank lines.
fn clean_csv_content(content: &str) -> String {
    content
        .replace("\"\"\"", "\"")
        .replace("\"\"", "\"")
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
