//! Record sinks and sources for generated datasets.
//!
//! CSV rows follow the fixed column order of [`SimulationRecord`]; JSON lines carry one
//! serialized record per line.

pub mod report;

pub use report::FailureReport;

use crate::config::OutputFormat;
use crate::simulation::SimulationRecord;
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Dataset column order
pub const COLUMNS: [&str; 10] = [
    "machine_id",
    "cycle",
    "day",
    "day_in_cycle",
    "temperature",
    "vibration",
    "rpm",
    "load",
    "service_flag",
    "failure_event",
];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV parse error at line {line}: {message}")]
    CsvParse { line: u64, message: String },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Empty dataset")]
    Empty,
}

/// CSV view of a record with the fixed per-column precision
#[derive(Serialize)]
struct CsvRow {
    machine_id: u32,
    cycle: u32,
    day: u32,
    day_in_cycle: u32,
    #[serde(serialize_with = "two_decimals")]
    temperature: f64,
    #[serde(serialize_with = "four_decimals")]
    vibration: f64,
    #[serde(serialize_with = "one_decimal")]
    rpm: f64,
    #[serde(serialize_with = "one_decimal")]
    load: f64,
    service_flag: u8,
    failure_event: u8,
}

impl From<&SimulationRecord> for CsvRow {
    fn from(r: &SimulationRecord) -> Self {
        Self {
            machine_id: r.machine_id,
            cycle: r.cycle,
            day: r.day,
            day_in_cycle: r.day_in_cycle,
            temperature: r.temperature,
            vibration: r.vibration,
            rpm: r.rpm,
            load: r.load,
            service_flag: r.service_flag,
            failure_event: r.failure_event,
        }
    }
}

fn one_decimal<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.1}"))
}

fn two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.2}"))
}

fn four_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&format_args!("{value:.4}"))
}

/// Write records to `path` in the requested format
pub fn write(
    path: impl AsRef<Path>,
    format: OutputFormat,
    records: &[SimulationRecord],
) -> Result<(), DatasetError> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Csv => write_csv(writer, records),
        OutputFormat::Jsonl => write_jsonl(writer, records),
    }
}

/// Write the header, then one row per record. The header is written even for no records.
pub fn write_csv<W: Write>(writer: W, records: &[SimulationRecord]) -> Result<(), DatasetError> {
    let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(COLUMNS)?;

    for record in records {
        csv.serialize(CsvRow::from(record))?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_jsonl<W: Write>(
    mut writer: W,
    records: &[SimulationRecord],
) -> Result<(), DatasetError> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Read a CSV dataset written by [`write_csv`]
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<SimulationRecord>, DatasetError> {
    parse_csv(BufReader::new(File::open(path)?))
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<SimulationRecord>, DatasetError> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.is_empty() {
        return Err(DatasetError::Empty);
    }
    if let Some(missing) = COLUMNS.iter().find(|name| !headers.iter().any(|h| h == **name)) {
        return Err(DatasetError::MissingColumn(missing.to_string()));
    }

    let mut records = Vec::new();
    for result in csv.deserialize::<SimulationRecord>() {
        let record = result.map_err(|err| DatasetError::CsvParse {
            line: err.position().map_or(0, |pos| pos.line()),
            message: err.to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}
