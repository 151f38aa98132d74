use crate::config::PipelineConfig;
use crate::error::{Result, RosterError};
use crate::types::{
    CumlaudeLeader, FilterReport, HonorsPredicate, PipelineResult, ProgramMean, RosterSummary,
};
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Output locations
// ============================================================================

/// Files produced by one run, all derived from the cleaned-table path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Cleaned and classified roster.
    pub cleaned: PathBuf,
    /// `<stem>_program_summary.csv`
    pub program_summary: PathBuf,
    /// `<stem>_report.json`
    pub report: PathBuf,
}

impl OutputPaths {
    pub fn for_output(cleaned: &Path) -> Self {
        let stem = cleaned
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "roster".to_string());
        let sibling = |suffix: &str| cleaned.with_file_name(format!("{}{}", stem, suffix));

        Self {
            cleaned: cleaned.to_path_buf(),
            program_summary: sibling("_program_summary.csv"),
            report: sibling("_report.json"),
        }
    }

    /// `<input-stem>_cleaned.csv` next to the input file.
    pub fn default_for_input(input: &Path) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "roster".to_string());
        Self::for_output(&input.with_file_name(format!("{}_cleaned.csv", stem)))
    }
}

// ============================================================================
// Run report
// ============================================================================

/// Count of graduates for one honors predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HonorsCount {
    pub predicate: HonorsPredicate,
    pub english: String,
    pub count: usize,
}

/// Serializable record of one run, used for `--json` and `--emit-report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    pub input_file: String,
    /// Path to the cleaned table, when it was written
    pub output_file: Option<String>,
    /// Path to the program summary table, when it was written
    pub program_summary_file: Option<String>,
    pub graduation_year: i32,
    /// Per-rule accounting, in execution order
    pub filter_reports: Vec<FilterReport>,
    pub summary: RosterSummary,
    pub program_means: Vec<ProgramMean>,
    pub cumlaude_leader: Option<CumlaudeLeader>,
    pub honors_distribution: Vec<HonorsCount>,
}

// ============================================================================
// Generator
// ============================================================================

/// Writes the run artifacts. Nothing is written until the pipeline has
/// produced a complete [`PipelineResult`].
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    paths: OutputPaths,
    write_program_summary: bool,
}

impl ReportGenerator {
    pub fn new(paths: OutputPaths, config: &PipelineConfig) -> Self {
        Self {
            paths,
            write_program_summary: config.write_program_summary,
        }
    }

    pub fn paths(&self) -> &OutputPaths {
        &self.paths
    }

    /// Write the cleaned table, the program summary (when enabled) and the
    /// run report (when given) as one unit.
    ///
    /// Every artifact is staged to a `.partial` sibling first; the final
    /// names appear only once all of them were staged, so a failed write
    /// leaves none of this run's files behind. Returns the paths written.
    pub fn write_artifacts(
        &self,
        result: &PipelineResult,
        report: Option<&RunReport>,
    ) -> Result<Vec<PathBuf>> {
        let mut staged = StagedFiles::default();

        staged.stage(&self.paths.cleaned, |file| write_csv(file, &result.cleaned))?;
        if self.write_program_summary {
            staged.stage(&self.paths.program_summary, |file| {
                write_csv(file, &result.program_summary)
            })?;
        }
        if let Some(report) = report {
            let content = serde_json::to_string_pretty(report)?;
            staged.stage(&self.paths.report, |file| {
                file.write_all(content.as_bytes())?;
                Ok(())
            })?;
        }

        let written = staged.commit()?;
        for path in &written {
            info!("Saved: {}", path.display());
        }
        Ok(written)
    }

    /// Build the run report for a finished pipeline.
    pub fn build_run_report(
        &self,
        input_file: &Path,
        result: &PipelineResult,
        config: &PipelineConfig,
        tables_written: bool,
    ) -> RunReport {
        let honors_distribution = result
            .honors_counts
            .iter()
            .map(|(predicate, count)| HonorsCount {
                predicate: *predicate,
                english: predicate.english().to_string(),
                count: *count,
            })
            .collect();

        RunReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.display().to_string(),
            output_file: tables_written.then(|| self.paths.cleaned.display().to_string()),
            program_summary_file: (tables_written && self.write_program_summary)
                .then(|| self.paths.program_summary.display().to_string()),
            graduation_year: config.graduation_year,
            filter_reports: result.filter_reports.clone(),
            summary: result.summary.clone(),
            program_means: result.program_means.clone(),
            cumlaude_leader: result.cumlaude_leader.clone(),
            honors_distribution,
        }
    }
}

/// Text preview of the first `rows` rows of a table.
pub fn console_preview(df: &DataFrame, rows: usize) -> String {
    format!("{}", df.head(Some(rows)))
}

fn write_csv(file: &mut File, df: &DataFrame) -> Result<()> {
    let mut df = df.clone();
    CsvWriter::new(file)
        .include_header(true)
        .with_separator(b',')
        .with_quote_char(b'"')
        .finish(&mut df)?;
    Ok(())
}

/// Artifacts written to temporary siblings, waiting to be renamed into place.
///
/// Dropping without [`StagedFiles::commit`] removes every temporary file.
#[derive(Debug, Default)]
struct StagedFiles {
    pending: Vec<(PathBuf, PathBuf)>,
}

impl StagedFiles {
    fn stage<F>(&mut self, path: &Path, write: F) -> Result<()>
    where
        F: FnOnce(&mut File) -> Result<()>,
    {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| RosterError::OutputFailed(format!("{}: {}", dir.display(), e)))?;
        }

        let tmp = path.with_extension("partial");
        let outcome = File::create(&tmp)
            .map_err(RosterError::from)
            .and_then(|mut file| {
                write(&mut file)?;
                file.flush()?;
                Ok(())
            });

        if let Err(e) = outcome {
            let _ = fs::remove_file(&tmp);
            return Err(RosterError::OutputFailed(format!("{}: {}", path.display(), e)));
        }

        debug!("Staged {}", tmp.display());
        self.pending.push((tmp, path.to_path_buf()));
        Ok(())
    }

    fn commit(mut self) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(self.pending.len());
        while !self.pending.is_empty() {
            let (tmp, path) = self.pending.remove(0);
            if let Err(e) = fs::rename(&tmp, &path) {
                let _ = fs::remove_file(&tmp);
                return Err(RosterError::OutputFailed(format!("{}: {}", path.display(), e)));
            }
            written.push(path);
        }
        Ok(written)
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        for (tmp, _) in &self.pending {
            let _ = fs::remove_file(tmp);
        }
    }
}
