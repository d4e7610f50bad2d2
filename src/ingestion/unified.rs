//! Unified ingestion entrypoint.
//!
//! Most callers should use [`ingest_from_path`], which reads a file into an in-memory
//! [`crate::types::Table`]. If [`IngestionOptions::format`] is `None`, the ingestion format is
//! inferred from the file extension.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{RemapError, RemapResult};
use crate::types::Table;

use super::json::FlattenOptions;
use super::{csv, json};

/// Supported ingestion formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionFormat {
    /// Comma-separated values.
    Csv,
    /// JSON array-of-objects, single object, or NDJSON.
    Json,
}

impl IngestionFormat {
    /// Parse an ingestion format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Options controlling unified ingestion behavior.
///
/// Use [`Default`] for common cases.
#[derive(Debug, Clone, Default)]
pub struct IngestionOptions {
    /// If `None`, auto-detect format from file extension.
    pub format: Option<IngestionFormat>,
    /// How nested JSON records become columns.
    pub flatten: FlattenOptions,
}

/// Unified ingestion entry point for path-based sources.
///
/// ```no_run
/// use record_remap::ingestion::{ingest_from_path, IngestionOptions};
///
/// # fn main() -> Result<(), record_remap::RemapError> {
/// // Uses `.ndjson` to select JSON ingestion.
/// let table = ingest_from_path("events.ndjson", &IngestionOptions::default())?;
/// println!("rows={}", table.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(path: impl AsRef<Path>, options: &IngestionOptions) -> RemapResult<Table> {
    let path = path.as_ref();
    let fmt = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let result = match fmt {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path),
        IngestionFormat::Json => json::ingest_json_from_path(path, &options.flatten),
    };

    match &result {
        Ok(table) => debug!(
            format = ?fmt,
            path = %path.display(),
            rows = table.row_count(),
            columns = table.schema.len(),
            "ingested table"
        ),
        Err(e) => warn!(format = ?fmt, path = %path.display(), error = %e, "ingestion failed"),
    }

    result
}

fn infer_format_from_path(path: &Path) -> RemapResult<IngestionFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RemapError::SchemaMismatch {
            message: format!(
                "cannot infer format: path has no extension ({})",
                path.display()
            ),
        })?;

    IngestionFormat::from_extension(ext).ok_or_else(|| RemapError::SchemaMismatch {
        message: format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}
