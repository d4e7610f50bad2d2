//! CSV ingestion and output.

use std::io;
use std::path::Path;

use crate::error::{RemapError, RemapResult};
use crate::types::{Schema, Table, Value};

/// Ingest a CSV file into an in-memory [`Table`].
///
/// Rules:
///
/// - CSV must have headers, and header names must be unique.
/// - Every non-empty cell becomes [`Value::Utf8`] (trimmed); empty cells become [`Value::Null`].
pub fn ingest_csv_from_path(path: impl AsRef<Path>) -> RemapResult<Table> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    ingest_csv_from_reader(&mut rdr)
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: io::Read>(rdr: &mut csv::Reader<R>) -> RemapResult<Table> {
    let headers = rdr.headers()?.clone();
    let schema = Schema::new(headers.iter());
    if schema.len() != headers.len() {
        return Err(RemapError::SchemaMismatch {
            message: format!(
                "duplicate column names in headers={:?}",
                headers.iter().collect::<Vec<_>>()
            ),
        });
    }

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (row_idx0, result) in rdr.records().enumerate() {
        // Report 1-based row number for users; +1 again because header is row 1.
        let user_row = row_idx0 + 2;
        let record = result?;
        if record.len() != headers.len() {
            return Err(RemapError::SchemaMismatch {
                message: format!(
                    "row {user_row} has {} values but the header has {}",
                    record.len(),
                    headers.len()
                ),
            });
        }
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(Table::new(schema, rows))
}

fn parse_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Value::Null
    } else {
        Value::Utf8(trimmed.to_owned())
    }
}

/// Write `table` as headered CSV, rendering every cell with its text form.
pub fn write_csv<W: io::Write>(table: &Table, writer: W) -> RemapResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.schema.field_names())?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
