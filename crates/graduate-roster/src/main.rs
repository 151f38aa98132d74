//! CLI entry point for the graduate roster pipeline.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use graduate_roster::reporting::{chart, console_preview};
use graduate_roster::{
    CumlaudeLeader, OutputPaths, Pipeline, PipelineConfig, PipelineResult, ReportGenerator,
    RunReport, load_roster,
};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Graduate roster validation and honors classification",
    long_about = "Cleans a graduate roster CSV, classifies every graduate and summarizes \
                  mean GPA per program.\n\n\
                  EXAMPLES:\n  \
                  # Clean a roster, writing lulusan_cleaned.csv next to it\n  \
                  graduate-roster lulusan.csv\n\n  \
                  # Explicit output and graduation year\n  \
                  graduate-roster lulusan.csv -o out/roster.csv --graduation-year 2024\n\n  \
                  # Custom thresholds and tokens\n  \
                  graduate-roster lulusan.csv --config roster.json --emit-report"
)]
struct Args {
    /// Path to the roster CSV file
    input: PathBuf,

    /// Path of the cleaned CSV
    ///
    /// Defaults to <input-stem>_cleaned.csv next to the input. The program
    /// summary and report are written beside it.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with pipeline settings (missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Graduation year stamped on every record (defaults to the current year)
    #[arg(long)]
    graduation_year: Option<i32>,

    /// Leave the program_mean_gpa column out of the cleaned table
    #[arg(long)]
    no_program_mean: bool,

    /// Write a JSON run report next to the output (<output-stem>_report.json)
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output the JSON run report to stdout instead of the console summary
    ///
    /// Disables all logs so stdout only carries JSON.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and the final summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    let pipeline = build_pipeline(&args, config.clone())?;

    let data = load_roster(&args.input)
        .with_context(|| format!("Failed to load roster {}", args.input.display()))?;

    let result = match pipeline.process(data) {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    let paths = match &args.output {
        Some(output) => OutputPaths::for_output(output),
        None => OutputPaths::default_for_input(&args.input),
    };
    let generator = ReportGenerator::new(paths, &config);
    let report = generator.build_run_report(&args.input, &result, &config, true);

    // The report file is only written for --emit-report; --json prints it.
    let report_file = (args.emit_report && !args.json).then_some(&report);
    generator.write_artifacts(&result, report_file)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_console_summary(&report, &result, &config);

    Ok(())
}

/// Settings from `--config` (or defaults), with command line overrides.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(year) = args.graduation_year {
        config.graduation_year = year;
    }
    if args.no_program_mean {
        config.include_program_mean = false;
    }

    config.validate()?;
    Ok(config)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Print the console view of a finished run.
///
/// Uses `println!` rather than logging: this is the primary output and must
/// be visible regardless of the log level.
fn print_console_summary(report: &RunReport, result: &PipelineResult, config: &PipelineConfig) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("ROSTER CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Input:  {} ({} rows)", report.input_file, summary.rows_before);
    if let Some(ref output_file) = report.output_file {
        println!("Output: {} ({} rows)", output_file, summary.rows_after);
    }
    if let Some(ref summary_file) = report.program_summary_file {
        println!("Program summary: {}", summary_file);
    }
    println!();

    println!("Cleaning:");
    for filter in &report.filter_reports {
        println!("  {}", filter.console_line());
    }
    println!(
        "  Rows: {} -> {} ({} removed, {:.1}%)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed,
        summary.rows_removed_percentage()
    );
    println!();

    println!(
        "Cleaned roster (first {} rows):",
        config.preview_rows.min(result.cleaned.height())
    );
    println!("{}", console_preview(&result.cleaned, config.preview_rows));
    println!();

    print!(
        "{}",
        chart::program_mean_chart(&report.program_means, config.max_gpa, chart::DEFAULT_BAR_WIDTH)
    );
    println!();
    print!(
        "{}",
        chart::honors_chart(&result.honors_counts, chart::DEFAULT_BAR_WIDTH)
    );
    println!();

    println!("{}", CumlaudeLeader::console_line(report.cumlaude_leader.as_ref()));

    if !summary.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
    }

    println!();
    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save the JSON run report");
    println!("{}", "=".repeat(80));
}
