//! Output formatting and persistence for flight reports.
//!
//! Supports pretty-printing, JSON serialization (optionally gzip-compressed)
//! and a CSV export of the delta model.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use tracing::{debug, info};

use crate::analyzers::delta::DeltaModelEntry;
use crate::analyzers::report::FlightReport;

/// Version stamp of the JSON report layout.
pub const SCHEMA_VERSION: u8 = 1;

/// What gets written to disk: the report plus when and how it was produced.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'r, 'a> {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub source: &'r str,
    pub report: &'r FlightReport<'a>,
}

impl<'r, 'a> ReportEnvelope<'r, 'a> {
    pub fn new(source: &'r str, report: &'r FlightReport<'a>) -> Self {
        ReportEnvelope {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            source,
            report,
        }
    }
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &FlightReport<'_>) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json(report: &FlightReport<'_>) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes `envelope` as JSON to `path`, gzip-compressed when `gzip` is set.
pub fn write_report_json(path: &str, envelope: &ReportEnvelope<'_, '_>, gzip: bool) -> Result<()> {
    debug!(path, gzip, "Writing report JSON");

    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let writer = BufWriter::new(file);

    if gzip {
        let mut encoder = GzEncoder::new(writer, Compression::default());
        serde_json::to_writer(&mut encoder, envelope)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = writer;
        serde_json::to_writer_pretty(&mut writer, envelope)?;
        writer.flush()?;
    }

    info!(path, "Report written");
    Ok(())
}

#[derive(Serialize)]
struct DeltaRow<'e> {
    flight_number: &'e str,
    start_revenue: f64,
    result_revenue: f64,
    delta: f64,
    percent: Option<f64>,
}

/// Writes the delta model to a CSV file with a header row.
///
/// Undefined percentages are written as empty cells.
pub fn write_delta_csv(path: &str, entries: &[DeltaModelEntry]) -> Result<()> {
    debug!(path, rows = entries.len(), "Writing delta CSV");

    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Failed to create {path}"))?;

    for entry in entries {
        writer.serialize(DeltaRow {
            flight_number: &entry.flight_number,
            start_revenue: entry.start_revenue,
            result_revenue: entry.result_revenue,
            delta: entry.delta,
            percent: entry.percent,
        })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::report::build_report;
    use crate::config::ReportConfig;
    use crate::record::{FlightRecord, Stage};
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::Read;

    #[test]
    fn test_print_pretty_does_not_panic() {
        let records = sample();
        let report = build_report(&records, &ReportConfig::default()).unwrap();
        print_pretty(&report);
    }

    #[test]
    fn test_print_json_does_not_panic() {
        let records = sample();
        let report = build_report(&records, &ReportConfig::default()).unwrap();
        print_json(&report).unwrap();
    }

    #[test]
    fn test_write_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let path = path.to_str().unwrap();
        let records = sample();
        let report = build_report(&records, &ReportConfig::default()).unwrap();

        write_report_json(path, &ReportEnvelope::new("flights.json", &report), false).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(value["schema_version"], 1);
        assert_eq!(value["source"], "flights.json");
        assert_eq!(value["report"]["totals"]["records"], 2);
        assert_eq!(value["report"]["moved_flights"][0]["flight_id"], "F1");
    }

    #[test]
    fn test_write_report_json_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json.gz");
        let path = path.to_str().unwrap();
        let records = sample();
        let report = build_report(&records, &ReportConfig::default()).unwrap();

        write_report_json(path, &ReportEnvelope::new("flights.json", &report), true).unwrap();

        let mut content = String::new();
        GzDecoder::new(fs::File::open(path).unwrap())
            .read_to_string(&mut content)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["report"]["delta_model"]["entries"][0]["flight_number"], "SU100");
    }

    #[test]
    fn test_write_delta_csv_one_row_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delta.csv");
        let path = path.to_str().unwrap();
        let entries = vec![
            DeltaModelEntry {
                flight_number: "SU100".into(),
                start_revenue: 300.0,
                result_revenue: 350.0,
                delta: 50.0,
                percent: Some(50.0 / 3.0),
            },
            DeltaModelEntry {
                flight_number: "SU200".into(),
                start_revenue: 0.0,
                result_revenue: 500.0,
                delta: 500.0,
                percent: None,
            },
        ];

        write_delta_csv(path, &entries).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "flight_number,start_revenue,result_revenue,delta,percent");
        assert!(lines[1].starts_with("SU100,300.0,350.0,50.0,16.66"));
        assert_eq!(lines[2], "SU200,0.0,500.0,500.0,");
    }

    // Helper functions for tests
    fn sample() -> Vec<FlightRecord> {
        vec![
            FlightRecord::new("F1", "SU100", Stage::Start, 1000, 300.0, false),
            FlightRecord::new("F1", "SU100", Stage::Result, 5000, 350.0, true),
        ]
    }
}
