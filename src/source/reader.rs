//! CSV decoding for the RIVM municipal feed.

use super::SourceError;
use crate::analysis;
use crate::models::{CaseRecord, RawRow};
use std::io::Read;
use tracing::{debug, info};

/// Headers every feed must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Datum",
    "Gemeentenaam",
    "Gemeentecode",
    "Provincienaam",
    "Aantal",
];

/// Validated records plus bookkeeping about what was dropped.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    /// Records that passed validation, in feed order.
    pub records: Vec<CaseRecord>,
    /// Data rows seen (excluding the header).
    pub total_rows: usize,
    /// Rows dropped as malformed.
    pub skipped: usize,
}

/// Decode a CSV stream into validated records.
///
/// Fails only when the header row is unreadable or lacks a required column.
/// Undecodable or invalid rows are counted and skipped.
pub fn read_records<R: Read>(input: R) -> Result<Ingested, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(SourceError::MissingColumn(column));
        }
    }

    let mut total_rows = 0;
    let mut rows = Vec::new();

    for result in reader.deserialize::<RawRow>() {
        total_rows += 1;
        match result {
            Ok(row) => rows.push(row),
            Err(e) => debug!("Skipping undecodable row {}: {}", total_rows, e),
        }
    }

    let records = analysis::parse(rows);
    let skipped = total_rows - records.len();

    info!(
        "Parsed {} records from {} rows ({} skipped)",
        records.len(),
        total_rows,
        skipped
    );

    Ok(Ingested {
        records,
        total_rows,
        skipped,
    })
}
