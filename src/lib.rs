//! `record-remap` turns raw query results into normalized tables using declarative configs.
//!
//! A normalization config says which rows to keep, which literal columns to add, and how to
//! rename or fan out columns:
//!
//! ```yaml
//! conditions:            # "*" keeps everything; a list of groups is OR-of-AND
//!   - {event: logon, user: not null}
//!   - {event: [unlock, reconnect]}
//! extensions: {source: siem}
//! mapping:
//!   user: Account
//!   src_ip: [SourceIp, IpAddress]
//! ```
//!
//! The primary entrypoint is [`processing::normalize_value`], which checks the config's shape,
//! applies it to an in-memory [`types::Table`], and returns a table of text cells with
//! duplicate rows removed. A config missing `conditions` or `mapping` yields an empty table
//! rather than an error.
//!
//! ## Quick example
//!
//! ```rust
//! use record_remap::ingestion::{flatten_records, FlattenOptions};
//! use record_remap::processing::normalize_value;
//!
//! # fn main() -> Result<(), record_remap::RemapError> {
//! let records = vec![
//!     serde_json::json!({"event": "logon", "user": "ada", "src": {"ip": "10.0.0.1"}}),
//!     serde_json::json!({"event": "logoff", "user": "ada", "src": {"ip": "10.0.0.1"}}),
//! ];
//! let table = flatten_records(&records, &FlattenOptions::default())?;
//!
//! let config = serde_json::json!({
//!     "conditions": {"event": "logon"},
//!     "mapping": {"user": "Account", "src.ip": "SourceIp"}
//! });
//! let out = normalize_value(&table, &config)?;
//! assert_eq!(out.row_count(), 1);
//! assert_eq!(out.get(0, "SourceIp").and_then(|v| v.as_str()), Some("10.0.0.1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`config`]: typed configs, the shape check, and JSON/YAML config loading
//! - [`processing`]: condition evaluation, row filtering, field mapping, normalization
//! - [`ingestion`]: CSV/JSON readers, record flattening, CSV output
//! - [`execution`]: parallel batch runs of many configs with observer hooks and metrics
//! - [`providers`]: connection arguments, query windows, and record sources
//!
//! The crate logs through `tracing` and never installs a subscriber.

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod types;

pub use error::{RemapError, RemapResult};
