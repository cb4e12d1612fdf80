//! Reading exported flight datasets into [`FlightRecord`]s.
//!
//! Supports the JSON export (a top-level array), its gzip-compressed form and
//! a CSV file with the same column names.

use anyhow::{Context, Result, bail};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::record::FlightRecord;

/// Records of one dataset plus the number of entries that carried no stage.
#[derive(Debug, Default)]
pub struct LoadedDataset {
    pub records: Vec<FlightRecord>,
    /// Entries belonging to neither schedule variant.
    pub skipped_untagged: usize,
}

/// Decodes a JSON array of flight records.
///
/// Entries without a `stage` (missing or `null`) are skipped and counted.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array or a staged entry does
/// not match the record shape. The error names the offending entry index.
pub fn parse_flights_json(bytes: &[u8]) -> Result<LoadedDataset> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_slice(bytes).context("Dataset is not a JSON array")?;

    let mut dataset = LoadedDataset::default();
    for (index, entry) in entries.into_iter().enumerate() {
        if entry.get("stage").is_none_or(|s| s.is_null()) {
            dataset.skipped_untagged += 1;
            continue;
        }
        let record: FlightRecord = serde_json::from_value(entry)
            .with_context(|| format!("Invalid flight record at index {index}"))?;
        dataset.records.push(record);
    }

    debug!(
        records = dataset.records.len(),
        skipped_untagged = dataset.skipped_untagged,
        "JSON dataset parsed"
    );
    Ok(dataset)
}

/// Decodes CSV flight records with a header row.
///
/// Rows with an empty `stage` column are skipped and counted.
pub fn parse_flights_csv<R: Read>(reader: R) -> Result<LoadedDataset> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers()?.clone();
    let stage_col = headers
        .iter()
        .position(|h| h == "stage")
        .context("CSV dataset has no 'stage' column")?;

    let mut dataset = LoadedDataset::default();
    for (index, row) in rdr.records().enumerate() {
        let row = row.with_context(|| format!("Unreadable CSV row {}", index + 1))?;
        if row.get(stage_col).is_none_or(|s| s.trim().is_empty()) {
            dataset.skipped_untagged += 1;
            continue;
        }
        let record: FlightRecord = row
            .deserialize(Some(&headers))
            .with_context(|| format!("Invalid flight record in CSV row {}", index + 1))?;
        dataset.records.push(record);
    }

    debug!(
        records = dataset.records.len(),
        skipped_untagged = dataset.skipped_untagged,
        "CSV dataset parsed"
    );
    Ok(dataset)
}

/// Loads a dataset from disk, picking the format from the file extension:
/// `.json`, `.json.gz`, `.csv` or `.csv.gz`.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_flights(path: impl AsRef<Path>) -> Result<LoadedDataset> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let open = || File::open(path).with_context(|| format!("Failed to open {}", path.display()));

    let dataset = if name.ends_with(".json.gz") {
        let mut bytes = Vec::new();
        GzDecoder::new(open()?)
            .read_to_end(&mut bytes)
            .with_context(|| format!("Failed to decompress {}", path.display()))?;
        parse_flights_json(&bytes)?
    } else if name.ends_with(".json") {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        parse_flights_json(&bytes)?
    } else if name.ends_with(".csv.gz") {
        parse_flights_csv(GzDecoder::new(open()?))?
    } else if name.ends_with(".csv") {
        parse_flights_csv(open()?)?
    } else {
        bail!("Unsupported dataset format: {}", path.display());
    };

    if dataset.skipped_untagged > 0 {
        warn!(
            skipped = dataset.skipped_untagged,
            "Skipped records without a schedule stage"
        );
    }
    info!(records = dataset.records.len(), "Dataset loaded");

    Ok(dataset)
}
