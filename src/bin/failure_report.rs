//! Print the failure report for an existing CSV dataset.
//!
//! ```bash
//! # Report on the configured output file
//! failure_report
//!
//! # Report on a specific dataset, as JSON
//! failure_report --json machine_sensor_data.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use machine_failure_sim::config::Config;
use machine_failure_sim::dataset::{self, FailureReport};
use machine_failure_sim::telemetry::init_tracing;
use std::path::PathBuf;
use tracing::info;

/// Failure report over a generated dataset
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// CSV dataset to read (defaults to the configured output path)
    path: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let path = match args.path {
        Some(path) => path,
        None => Config::load()?.output.path,
    };

    let records = dataset::read_csv(&path)
        .with_context(|| format!("reading dataset {}", path.display()))?;
    let report = FailureReport::from_records(&records);
    info!(
        path = %path.display(),
        records = report.total_records,
        failures = report.total_failures(),
        "dataset loaded"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }

    Ok(())
}
