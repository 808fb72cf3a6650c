//! CLI entry point for the data insight pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use insight_pipeline::{
    ChartKind, FileInfo, PreprocessOutcome, Session, SessionConfig, SessionLog,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data insight pipeline: profile, clean, regress, chart and export a table",
    long_about = "Loads a CSV or XLSX table, prints a quality report, scores a linear \
                  regression baseline before and after cleaning, draws charts and \
                  exports the results.\n\n\
                  EXAMPLES:\n  \
                  # Quality report and regression baseline\n  \
                  insight-pipeline -i data.csv\n\n  \
                  # Every chart, exported with the session log\n  \
                  insight-pipeline -i data.csv --chart all --export-figure report.pdf\n\n  \
                  # Remove box plot outliers and save the table\n  \
                  insight-pipeline -i data.csv --chart box-plot --export-table filtered.csv"
)]
struct Args {
    /// Path to the CSV or XLSX file to analyse
    #[arg(short, long)]
    input: PathBuf,

    /// Chart to generate (all, histogram, bar-plot, pie-chart, scatter-plot,
    /// line-plot, heat-map, box-plot)
    #[arg(short, long)]
    chart: Option<ChartKind>,

    /// Write the current table as CSV
    #[arg(long)]
    export_table: Option<PathBuf>,

    /// Write the figure and session log (.pdf or .png)
    #[arg(long)]
    export_figure: Option<PathBuf>,

    /// Number of rows shown in the quality report preview
    #[arg(long, default_value = "5")]
    preview_rows: usize,

    /// Fraction of rows held out when scoring the regression baseline
    #[arg(long, default_value = "0.2")]
    test_fraction: f64,

    /// Seed of the train/test split
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Number of histogram bins
    #[arg(long, default_value = "10")]
    bins: usize,

    /// IQR multiplier of the box plot outlier fences
    #[arg(long, default_value = "1.5")]
    iqr_multiplier: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON summary.
    #[arg(long)]
    json: bool,
}

/// Everything a run produced, printed with `--json`.
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    file: &'a FileInfo,
    preprocessing: &'a PreprocessOutcome,
    charts: Vec<ChartKind>,
    chart_failures: Vec<String>,
    rows_after_charts: usize,
    written: Vec<PathBuf>,
    log: &'a SessionLog,
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

    if !args.input.exists() {
        return Err(anyhow!("Input file not found: {}", args.input.display()));
    }

    let config = SessionConfig::builder()
        .preview_rows(args.preview_rows)
        .test_fraction(args.test_fraction)
        .split_seed(args.seed)
        .histogram_bins(args.bins)
        .iqr_multiplier(args.iqr_multiplier)
        .build()?;

    let mut session = Session::new(config)?;
    run(&mut session, &args).inspect_err(|e| error!("Run failed: {}", e))
}

fn run(session: &mut Session, args: &Args) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Loading {}", args.input.display());
    info!("{}", "=".repeat(80));

    let file = session.upload(&args.input)?.clone();
    let outcome = session.preprocess()?;

    let mut written = Vec::new();

    if let Some(kind) = args.chart {
        session.generate_chart(kind)?;
    }

    if let Some(ref path) = args.export_table {
        session.export_table(path)?;
        written.push(path.clone());
    }

    if let Some(ref path) = args.export_figure {
        written.extend(session.export_figure(path)?);
    }

    let (charts, chart_failures) = session
        .figure()
        .map(|figure| {
            let failures = figure
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.chart, f.message))
                .collect();
            (figure.kinds(), failures)
        })
        .unwrap_or_default();

    let summary = RunSummary {
        file: &file,
        preprocessing: &outcome,
        charts,
        chart_failures,
        rows_after_charts: session.raw().map(|d| d.height()).unwrap_or(0),
        written,
        log: session.log(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_human_readable_summary(&summary, &args.input);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(summary: &RunSummary<'_>, input: &Path) {
    let report = &summary.preprocessing.report;
    let regression = &summary.preprocessing.regression;
    let cleaning = &summary.preprocessing.cleaning;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns, {} bytes)",
        input.display(),
        summary.file.row_count,
        summary.file.column_count,
        summary.file.size_bytes
    );
    println!("Missing cells: {}", report.total_nulls());
    println!();

    println!("Cleaning:");
    println!(
        "  Rows: {} -> {} ({} with missing values, {} duplicates removed)",
        cleaning.rows_before,
        cleaning.rows_after,
        cleaning.missing_rows_removed,
        cleaning.duplicate_rows_removed
    );
    println!();

    println!(
        "Regression baseline ({}, {} -> {}):",
        regression.features[0], regression.features[1], regression.target
    );
    for (label, r2) in [
        ("before cleaning:", regression.r2_before),
        ("after cleaning: ", regression.r2_after),
    ] {
        match r2 {
            Some(r2) => println!("  R² {} {:.4}", label, r2),
            None => println!("  R² {} unavailable", label),
        }
    }
    println!();

    if !summary.charts.is_empty() {
        let names: Vec<&str> = summary.charts.iter().map(|k| k.display_name()).collect();
        println!("Charts: {}", names.join(", "));
        for failure in &summary.chart_failures {
            println!("  ! {}", failure);
        }
        println!("Rows after charts: {}", summary.rows_after_charts);
        println!();
    }

    if !summary.written.is_empty() {
        println!("Files written:");
        for path in &summary.written {
            println!("  - {}", path.display());
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
