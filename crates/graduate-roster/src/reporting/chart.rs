//! Horizontal bar charts for terminal output.
//!
//! Output is deterministic for a given input so charts can be compared
//! verbatim in tests.

use crate::types::{HonorsPredicate, ProgramMean};

/// Default number of cells for the longest bar.
pub const DEFAULT_BAR_WIDTH: usize = 40;

const BAR: char = '#';

/// Render labelled horizontal bars scaled against `scale_max`.
///
/// Values above `scale_max` are drawn at full width; a non-positive scale
/// draws empty bars.
pub fn render_bar_chart(
    title: &str,
    bars: &[(String, f64)],
    scale_max: f64,
    width: usize,
    precision: usize,
) -> String {
    let width = width.max(1);
    let label_width = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');

    if bars.is_empty() {
        out.push_str("  (no data)\n");
        return out;
    }

    for (label, value) in bars {
        let cells = if scale_max > 0.0 {
            ((value / scale_max).clamp(0.0, 1.0) * width as f64).round() as usize
        } else {
            0
        };
        let bar: String = std::iter::repeat_n(BAR, cells).collect();
        out.push_str(&format!(
            "  {:<label_width$} | {:<width$} {:.precision$}\n",
            label, bar, value
        ));
    }

    out
}

/// Mean GPA per program on a `0..=max_gpa` scale.
pub fn program_mean_chart(means: &[ProgramMean], max_gpa: f64, width: usize) -> String {
    let bars: Vec<(String, f64)> = means
        .iter()
        .map(|m| (m.program.clone(), m.mean_gpa))
        .collect();
    render_bar_chart("Mean GPA per program", &bars, max_gpa, width, 2)
}

/// Number of graduates per honors predicate, scaled to the largest count.
pub fn honors_chart(counts: &[(HonorsPredicate, usize)], width: usize) -> String {
    let bars: Vec<(String, f64)> = counts
        .iter()
        .map(|(predicate, count)| (predicate.as_str().to_string(), *count as f64))
        .collect();
    let scale = counts.iter().map(|(_, c)| *c).max().unwrap_or(0) as f64;
    render_bar_chart("Graduates per honors predicate", &bars, scale, width, 0)
}
