//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`ingest_from_path`] (from [`unified`]) which auto-detects the
//! format by file extension (or you can override via [`IngestionOptions`]) and reads the data
//! into an in-memory [`crate::types::Table`].
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`] (including [`flatten_records`] for records already in memory)

pub mod csv;
pub mod json;
pub mod unified;

pub use csv::write_csv;
pub use json::{flatten_records, table_from_split, FlattenOptions};
pub use unified::{ingest_from_path, IngestionFormat, IngestionOptions};
