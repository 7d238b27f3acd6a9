//! CSV round-tripping for the applicant snapshot schema.

use anyhow::{Context, Result};
use isardraw_engine::{Applicant, DrawError, missing_columns};
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Read an applicant snapshot, failing fast when required columns are absent.
pub fn read_snapshot(path: &Path, delimiter: u8) -> Result<Vec<Applicant>> {
    let file =
        File::open(path).with_context(|| format!("cannot open snapshot {}", path.display()))?;
    read_snapshot_from(file, delimiter).with_context(|| format!("reading {}", path.display()))
}

pub fn read_snapshot_from<R: Read>(reader: R, delimiter: u8) -> Result<Vec<Applicant>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(reader);
    let headers = csv_reader.headers().context("snapshot has no header row")?;
    let missing = missing_columns(headers.iter());
    if !missing.is_empty() {
        return Err(DrawError::MissingColumns(missing).into());
    }
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row.context("malformed snapshot row")?);
    }
    Ok(rows)
}

/// Write any serializable record series with the schema's column order.
pub fn write_records<T: Serialize>(path: &Path, delimiter: u8, rows: &[T]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    write_records_to(file, delimiter, rows).with_context(|| format!("writing {}", path.display()))
}

pub fn write_records_to<W: Write, T: Serialize>(
    writer: W,
    delimiter: u8,
    rows: &[T],
) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);
    for row in rows {
        csv_writer.serialize(row).context("serializing record")?;
    }
    csv_writer.flush().context("flushing records")?;
    Ok(())
}
