//! CSV input/output for batch tables

use crate::errors::{EligibilityError, Result};
use crate::report::RecordTable;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

/// Read a table with a header row. Rows must have as many cells as the header.
pub fn read_csv<R: Read>(reader: R) -> Result<RecordTable> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let mut headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(EligibilityError::Table("table has no header row".into()));
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    RecordTable::new(headers, rows)
}

pub fn read_csv_file(path: &Path) -> Result<RecordTable> {
    let file = std::fs::File::open(path)?;
    let table = read_csv(file)?;
    info!(
        rows = table.len(),
        columns = table.headers().len(),
        "Read batch table from {}",
        path.display()
    );
    Ok(table)
}

pub fn write_csv<W: Write>(table: &RecordTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(table.headers())?;
    for row in table.rows() {
        csv_writer.write_record(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_csv_file(table: &RecordTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = std::fs::File::create(path)?;
    write_csv(table, file)?;
    info!(rows = table.len(), "Wrote report to {}", path.display());
    Ok(())
}
