//! JSON ingestion and record flattening.
//!
//! Supported inputs:
//! - A JSON array of objects: `[{"a":1}, {"a":2}]`
//! - A single JSON object
//! - Newline-delimited JSON (NDJSON): `{"a":1}\n{"a":2}\n`
//!
//! Nested objects are flattened into dotted column names (`{"src":{"ip":"x"}}` becomes column
//! `src.ip`). Columns appear in the order they are first seen across records; a record lacking
//! a column gets [`Value::Null`] there.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{RemapError, RemapResult};
use crate::types::{Schema, Table, Value};

/// Options controlling how nested records become columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Joins parent and child keys.
    pub separator: String,
    /// Deepest object level that is still expanded; `None` expands everything.
    ///
    /// With `Some(0)` only top-level keys become columns and nested objects are kept as JSON
    /// text.
    pub max_depth: Option<usize>,
    /// Column names to drop. An entry also drops every column nested below it.
    pub exclude: Vec<String>,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            separator: ".".to_string(),
            max_depth: None,
            exclude: Vec::new(),
        }
    }
}

impl FlattenOptions {
    fn is_excluded(&self, column: &str) -> bool {
        self.exclude.iter().any(|e| {
            column == e
                || column
                    .strip_prefix(e.as_str())
                    .is_some_and(|rest| rest.starts_with(self.separator.as_str()))
        })
    }
}

/// Ingest JSON from a file into a [`Table`].
pub fn ingest_json_from_path(path: impl AsRef<Path>, options: &FlattenOptions) -> RemapResult<Table> {
    let text = fs::read_to_string(path)?;
    ingest_json_from_str(&text, options)
}

/// Ingest JSON from an in-memory string into a [`Table`].
pub fn ingest_json_from_str(input: &str, options: &FlattenOptions) -> RemapResult<Table> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RemapError::SchemaMismatch {
            message: "json input is empty".to_string(),
        });
    }

    // First try parsing as a single JSON value (array or object).
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        match v {
            serde_json::Value::Array(items) => flatten_records(&items, options),
            serde_json::Value::Object(_) => flatten_records(std::slice::from_ref(&v), options),
            _ => Err(RemapError::SchemaMismatch {
                message: "json must be an object, an array of objects, or NDJSON".to_string(),
            }),
        }
    } else {
        // Fall back to NDJSON.
        let mut values = Vec::new();
        for (i, line) in trimmed.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let v = serde_json::from_str::<serde_json::Value>(line).map_err(|e| {
                RemapError::SchemaMismatch {
                    message: format!("invalid ndjson at line {}: {}", i + 1, e),
                }
            })?;
            values.push(v);
        }
        flatten_records(&values, options)
    }
}

/// Flatten JSON object records into a [`Table`].
///
/// Arrays, and objects nested deeper than [`FlattenOptions::max_depth`], are stored as compact
/// JSON text. Fails if any record is not a JSON object.
pub fn flatten_records(records: &[serde_json::Value], options: &FlattenOptions) -> RemapResult<Table> {
    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut sparse_rows: Vec<Vec<(usize, Value)>> = Vec::with_capacity(records.len());

    for (idx0, record) in records.iter().enumerate() {
        let obj = record.as_object().ok_or_else(|| RemapError::SchemaMismatch {
            message: format!("row {} is not a json object", idx0 + 1),
        })?;

        let mut cells = Vec::new();
        flatten_object(obj, "", 0, options, &mut cells);

        let mut row = Vec::with_capacity(cells.len());
        for (column, value) in cells {
            let pos = *positions.entry(column.clone()).or_insert_with(|| {
                columns.push(column);
                columns.len() - 1
            });
            row.push((pos, value));
        }
        sparse_rows.push(row);
    }

    let width = columns.len();
    let rows = sparse_rows
        .into_iter()
        .map(|cells| {
            let mut row = vec![Value::Null; width];
            for (pos, value) in cells {
                row[pos] = value;
            }
            row
        })
        .collect();

    Ok(Table::new(Schema::new(columns), rows))
}

fn flatten_object(
    obj: &serde_json::Map<String, serde_json::Value>,
    prefix: &str,
    depth: usize,
    options: &FlattenOptions,
    out: &mut Vec<(String, Value)>,
) {
    for (key, v) in obj {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}{}{key}", options.separator)
        };
        if options.is_excluded(&column) {
            continue;
        }
        match v {
            serde_json::Value::Object(child) if options.max_depth.is_none_or(|max| depth < max) => {
                flatten_object(child, &column, depth + 1, options, out);
            }
            other => out.push((column, json_cell(other))),
        }
    }
}

/// Scalars map to the matching [`Value`]; containers become compact JSON text.
fn json_cell(v: &serde_json::Value) -> Value {
    Value::from_json_scalar(v).unwrap_or_else(|| Value::Utf8(v.to_string()))
}

/// Build a [`Table`] from the split orientation: a column list plus row arrays.
///
/// This is the shape flow queries return (`{"columns": [...], "data": [[...], ...]}`).
pub fn table_from_split(columns: &[String], data: &[serde_json::Value]) -> RemapResult<Table> {
    let schema = Schema::new(columns.iter().cloned());
    if schema.len() != columns.len() {
        return Err(RemapError::SchemaMismatch {
            message: format!("duplicate column names in {columns:?}"),
        });
    }

    let mut rows = Vec::with_capacity(data.len());
    for (idx0, row) in data.iter().enumerate() {
        let cells = row.as_array().ok_or_else(|| RemapError::SchemaMismatch {
            message: format!("row {} is not a json array", idx0 + 1),
        })?;
        if cells.len() != columns.len() {
            return Err(RemapError::SchemaMismatch {
                message: format!(
                    "row {} has {} values but {} columns were declared",
                    idx0 + 1,
                    cells.len(),
                    columns.len()
                ),
            });
        }
        rows.push(cells.iter().map(json_cell).collect());
    }

    Ok(Table::new(schema, rows))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{flatten_records, table_from_split, FlattenOptions};
    use crate::types::{Schema, Value};

    #[test]
    fn nested_objects_become_dotted_columns() {
        let records = vec![
            json!({"id": 1, "src": {"ip": "10.0.0.1", "geo": {"cc": "NL"}}}),
            json!({"id": 2, "dst": {"port": 443}}),
        ];
        let t = flatten_records(&records, &FlattenOptions::default()).unwrap();
        assert_eq!(
            t.schema,
            Schema::new(["id", "src.ip", "src.geo.cc", "dst.port"])
        );
        assert_eq!(t.get(0, "src.geo.cc"), Some(&Value::from("NL")));
        assert_eq!(t.get(1, "src.ip"), Some(&Value::Null));
        assert_eq!(t.get(1, "dst.port"), Some(&Value::Int64(443)));
    }

    #[test]
    fn arrays_and_deep_objects_are_json_text() {
        let records = vec![json!({"tags": ["a", "b"], "x": {"y": {"z": 1}}})];
        let opts = FlattenOptions {
            max_depth: Some(1),
            ..Default::default()
        };
        let t = flatten_records(&records, &opts).unwrap();
        assert_eq!(t.get(0, "tags"), Some(&Value::from(r#"["a","b"]"#)));
        assert_eq!(t.get(0, "x.y"), Some(&Value::from(r#"{"z":1}"#)));
    }

    #[test]
    fn max_depth_zero_keeps_top_level_only() {
        let records = vec![json!({"a": {"b": 1}})];
        let opts = FlattenOptions {
            max_depth: Some(0),
            ..Default::default()
        };
        let t = flatten_records(&records, &opts).unwrap();
        assert_eq!(t.schema, Schema::new(["a"]));
    }

    #[test]
    fn exclude_drops_columns_and_their_children() {
        let records = vec![json!({"_meta": {"k": 1}, "assets": [1], "assetsx": 2, "id": 3})];
        let opts = FlattenOptions {
            exclude: vec!["_meta".to_string(), "assets".to_string()],
            ..Default::default()
        };
        let t = flatten_records(&records, &opts).unwrap();
        assert_eq!(t.schema, Schema::new(["assetsx", "id"]));
    }

    #[test]
    fn custom_separator() {
        let records = vec![json!({"a": {"b": 1}})];
        let opts = FlattenOptions {
            separator: "_".to_string(),
            ..Default::default()
        };
        let t = flatten_records(&records, &opts).unwrap();
        assert_eq!(t.schema, Schema::new(["a_b"]));
    }

    #[test]
    fn non_object_record_is_rejected() {
        let err = flatten_records(&[json!({"a": 1}), json!(2)], &FlattenOptions::default()).unwrap_err();
        assert!(err.to_string().contains("row 2 is not a json object"));
    }

    #[test]
    fn split_orientation() {
        let columns = vec!["src".to_string(), "bytes".to_string()];
        let t = table_from_split(&columns, &[json!(["a", 10]), json!([null, 2.5])]).unwrap();
        assert_eq!(t.rows[1], vec![Value::Null, Value::Float64(2.5)]);

        let err = table_from_split(&columns, &[json!(["a"])]).unwrap_err();
        assert!(err.to_string().contains("row 1 has 1 values"));
    }
}
