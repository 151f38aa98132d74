//! Shared text and numeric helpers used by the normalizer and filters.

use once_cell::sync::Lazy;
use regex::Regex;

// =============================================================================
// Text Utilities
// =============================================================================

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Common missing-value markers found in exported spreadsheets.
pub const MISSING_MARKERS: [&str; 9] = [
    "nan", "null", "none", "n/a", "na", "#n/a", "-", "missing", "unknown",
];

/// Trim and collapse every internal whitespace run to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Canonical form of a column header: trimmed, lower-cased, single-spaced.
pub fn normalize_header(header: &str) -> String {
    collapse_whitespace(header).to_lowercase()
}

/// Title-case a value: a letter is upper-cased when it follows a non-letter
/// and lower-cased otherwise, so `"o'neil"` becomes `"O'Neil"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_is_letter = false;

    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }

    out
}

/// Check if a string is a missing-value marker.
pub fn is_missing_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    MISSING_MARKERS.iter().any(|&marker| lower == marker)
}

/// Case-insensitive substring match against any of the given tokens.
pub fn contains_any_token(value: &str, tokens: &[String]) -> bool {
    let haystack = value.to_lowercase();
    tokens
        .iter()
        .filter(|t| !t.is_empty())
        .any(|t| haystack.contains(&t.to_lowercase()))
}

// =============================================================================
// Numeric Parsing Utilities
// =============================================================================

/// Parse a decimal value, tolerating surrounding whitespace and a decimal
/// comma (`"3,45"`). Returns `None` for blanks, markers and garbage.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() || is_missing_marker(trimmed) {
        return None;
    }

    let candidate = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };

    candidate.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a semester count. Integral decimals such as `"8.0"` are accepted;
/// fractional values are malformed.
pub fn parse_semesters(s: &str) -> Option<i64> {
    let value = parse_decimal(s)?;
    if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

// =============================================================================
// Tests
// =============================================================================
