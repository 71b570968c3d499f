//! forecast-prep CLI Module
//!
//! Command-line interface for the sales forecasting data-preparation step.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::error::PrepError;
use crate::split::{SeriesSplitter, SplitConfig, Step};
use crate::utils::{DataLoader, DataSaver};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString {
    s.truecolor(100, 100, 100)
}
fn accent(s: &str) -> ColoredString {
    s.truecolor(120, 170, 255)
}
fn muted(s: &str) -> ColoredString {
    s.truecolor(140, 140, 140)
}
fn ok(s: &str) -> ColoredString {
    s.truecolor(100, 210, 120)
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "forecast-prep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train/inference windowing for multi-series sales forecasting")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Split a sales table into train and inference windows
    Split {
        /// Input data file (CSV, JSON, or Parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Which table to persist (train, inference)
        #[arg(short, long)]
        step: String,

        /// Directory the output file is written into
        #[arg(short, long)]
        output_path: PathBuf,

        /// Number of future periods to generate per series
        #[arg(long)]
        horizon: usize,

        /// Target lags as comma-separated integers (e.g. "1,2,4")
        #[arg(long)]
        lags: String,

        /// Name of the time column
        #[arg(long, default_value = "WeekStarting")]
        time_column: String,

        /// Name of the label column
        #[arg(long, default_value = "Quantity")]
        label_column: String,

        /// Exactly two comma-separated partition-key columns
        #[arg(long, default_value = "Store,Brand")]
        partitions: String,

        /// Output file name inside the output directory
        #[arg(long, default_value = "oj_sales.parquet")]
        file_name: String,
    },

    /// Show data information
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Argument conversion ───────────────────────────────────────────────────────

/// Parse a comma-separated lag list into typed values
fn parse_lags(raw: &str) -> anyhow::Result<Vec<usize>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PrepError::EmptyLagList.into());
    }
    trimmed
        .split(',')
        .map(|part| {
            part.trim().parse::<usize>().map_err(|_| {
                PrepError::ConfigError(format!("invalid lag: '{}'", part.trim())).into()
            })
        })
        .collect()
}

/// Parse a comma-separated pair of partition-key column names
fn parse_partitions(raw: &str) -> anyhow::Result<[String; 2]> {
    let parts: Vec<String> = raw
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    <[String; 2]>::try_from(parts).map_err(|parts| {
        PrepError::ConfigError(format!(
            "expected exactly two partition columns, got {}",
            parts.len()
        ))
        .into()
    })
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_split(
    data: &Path,
    step: &str,
    output_path: &Path,
    horizon: usize,
    lags: &str,
    time_column: &str,
    label_column: &str,
    partitions: &str,
    file_name: &str,
) -> anyhow::Result<()> {
    section("Split");

    let step: Step = step.parse()?;
    let target_lags = parse_lags(lags)?;
    let partition_columns = parse_partitions(partitions)?;

    std::fs::create_dir_all(output_path)?;

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::load(data)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        df.height(),
        df.width(),
        start.elapsed()
    ));

    let config = SplitConfig::new()
        .with_partitions(&partition_columns[0], &partition_columns[1])
        .with_time_column(time_column)
        .with_label_column(label_column)
        .with_target_lags(target_lags)
        .with_forecast_horizon(horizon);

    step_run("Splitting series");
    let start = Instant::now();
    let output = SeriesSplitter::new(config).split(&df)?;
    step_done(&format!(
        "{} train / {} inference rows in {:?}",
        output.train.height(),
        output.inference.height(),
        start.elapsed()
    ));

    let mut selected = output.select(step);
    let target = output_path.join(file_name);
    step_run("Writing output");
    DataSaver::save_parquet_uncompressed(&mut selected, &target)?;
    step_done(&format!("{} table -> {}", step, target.display()));

    Ok(())
}

pub fn cmd_info(data: &Path) -> anyhow::Result<()> {
    section("Info");

    let df = DataLoader::load(data)?;
    println!("  {}", kv("file", &data.display().to_string()));
    println!("  {}", kv("rows", &df.height().to_string()));
    println!("  {}", kv("cols", &df.width().to_string()));
    println!();

    for col in df.get_columns() {
        let name = format!("{:<24}", col.name());
        let dtype = format!("{:<12}", col.dtype().to_string());
        println!(
            "  {} {}  {}",
            muted(&name),
            dtype.as_str().white(),
            dim(&format!("{} nulls", col.null_count()))
        );
    }

    Ok(())
}
