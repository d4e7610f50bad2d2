//! In-memory table transformations driven by a [`crate::config::NormalizationConfig`].
//!
//! - [`condition`]: evaluation of one AND-group of column conditions
//! - [`filter()`]: row selection by condition set (wildcard, AND, OR-of-AND)
//! - [`map_fields()`]: column rename / fan-out
//! - [`normalize()`]: the full filter → extend → map → stringify → dedupe pipeline
//!
//! ## Example
//!
//! ```rust
//! use record_remap::processing::normalize_value;
//! use record_remap::types::{Schema, Table, Value};
//!
//! let table = Table::new(
//!     Schema::new(["id", "status"]),
//!     vec![
//!         vec![Value::Int64(1), Value::from("active")],
//!         vec![Value::Int64(2), Value::from("inactive")],
//!     ],
//! );
//! let config = serde_json::json!({
//!     "conditions": {"status": "active"},
//!     "extensions": {"source": "x"},
//!     "mapping": {"id": "ID", "status": "Status"}
//! });
//!
//! let out = normalize_value(&table, &config).unwrap();
//! assert_eq!(out.schema.field_names().collect::<Vec<_>>(), vec!["ID", "Status", "source"]);
//! assert_eq!(out.rows, vec![vec![Value::from("1"), Value::from("active"), Value::from("x")]]);
//! ```

pub mod condition;
pub mod filter;
pub mod map;
pub mod normalize;

pub use condition::{filter_condition, matching_rows};
pub use filter::{filter, select_rows};
pub use map::map_fields;
pub use normalize::{normalize, normalize_value};
