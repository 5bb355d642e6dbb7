//! CSV writer for flattened issue records.
//!
//! Rows may carry different key sets (the Snyk issue shape varies per
//! issue type), so the header is the union of all keys seen. The `id`
//! column always comes first; missing cells are written empty.

use crate::transform::{FlatRecord, Scalar};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

/// Column the writer pins to the front of the header.
const ID_COLUMN: &str = "id";

/// Compute the superset header for a batch of records.
///
/// `id` first (when any record has it), the rest in sorted order for a
/// deterministic file layout.
pub fn superset_header(records: &[FlatRecord]) -> Vec<String> {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for record in records {
        keys.extend(record.keys().map(String::as_str));
    }

    let mut header: Vec<String> = Vec::with_capacity(keys.len());
    if keys.remove(ID_COLUMN) {
        header.push(ID_COLUMN.to_string());
    }
    header.extend(keys.into_iter().map(String::from));
    header
}

/// Write records as CSV to any writer.
pub fn write_csv<W: Write>(records: &[FlatRecord], writer: W) -> Result<()> {
    let header = superset_header(records);
    if header.is_empty() {
        return Ok(());
    }
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(&header)
        .context("Failed to write CSV header")?;

    for record in records {
        let row: Vec<String> = header
            .iter()
            .map(|key| {
                record
                    .get(key)
                    .map(|value| value.to_string())
                    .unwrap_or_default()
            })
            .collect();
        csv_writer.write_record(&row).context("Failed to write CSV row")?;
    }

    csv_writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Write records as CSV to a file path.
pub fn write_csv_file(records: &[FlatRecord], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(records, file)
        .with_context(|| format!("Failed to write CSV to {}", path.display()))
}

/// Read a flat CSV back into records.
///
/// All cells come back as text; empty cells become absent keys, so a
/// row keeps only the columns it actually had values for.
pub fn read_csv_file(path: &Path) -> Result<Vec<FlatRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header from {}", path.display()))?
        .clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.context("Failed to read CSV row")?;
        let record: FlatRecord = headers
            .iter()
            .zip(row.iter())
            .filter(|(_, cell)| !cell.is_empty())
            .map(|(key, cell)| (key.to_string(), Scalar::from(cell)))
            .collect();
        records.push(record);
    }
    Ok(records)
}
