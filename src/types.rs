//! Core data model types.
//!
//! Query results are held in an in-memory [`Table`]: an ordered [`Schema`] of unique column
//! names plus row-major [`Value`] storage. Before normalization a column may hold values of
//! different types; after normalization every cell is [`Value::Utf8`].

use std::collections::HashSet;
use std::fmt;

/// A single cell value in a [`Table`].
///
/// An absent cell (a record that did not carry the column) is stored as [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the string slice for [`Value::Utf8`] cells.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Utf8(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a JSON scalar into a [`Value`].
    ///
    /// Returns `None` for arrays and objects. Integers that do not fit `i64` become floats.
    pub fn from_json_scalar(v: &serde_json::Value) -> Option<Value> {
        match v {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int64(i))
                } else {
                    n.as_f64().map(Value::Float64)
                }
            }
            serde_json::Value::String(s) => Some(Value::Utf8(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Render the value as text, consuming it (no allocation for [`Value::Utf8`]).
    pub fn into_text(self) -> String {
        match self {
            Value::Utf8(s) => s,
            other => other.to_string(),
        }
    }

    fn key(&self) -> CellKey<'_> {
        match self {
            Value::Null => CellKey::Null,
            Value::Int64(v) => CellKey::Int(*v),
            Value::Float64(v) => CellKey::Float(v.to_bits()),
            Value::Bool(v) => CellKey::Bool(*v),
            Value::Utf8(s) => CellKey::Str(s),
        }
    }
}

/// Text form used when cells are stringified.
///
/// `Null` renders as the empty string; floats always keep a fractional part or exponent
/// (`1.0`, `2.5`, `1e21`) so they stay distinguishable from integers.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int64(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Utf8(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Utf8(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Utf8(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Hashable identity of a cell; floats compare by bit pattern.
#[derive(Hash, PartialEq, Eq)]
enum CellKey<'a> {
    Null,
    Int(i64),
    Float(u64),
    Bool(bool),
    Str(&'a str),
}

/// Ordered list of unique column names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    /// Create a schema from column names. Later duplicates of a name are dropped.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        for c in columns {
            let c = c.into();
            if out.index_of(&c).is_none() {
                out.columns.push(c);
            }
        }
        out
    }

    /// Iterate column names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    /// Returns the index of a column by name, if present.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns `true` if the column exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// In-memory table.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] columns. All
/// transformations return a new table and leave `self` untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Column names.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from schema and rows.
    ///
    /// # Panics
    ///
    /// Panics if any row length differs from the schema column count.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        let expected = schema.len();
        for row in &rows {
            assert!(
                row.len() == expected,
                "row length {} does not match schema length {}",
                row.len(),
                expected
            );
        }
        Self { schema, rows }
    }

    /// A table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell at `row` in column `column`.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.schema.index_of(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// All values of a column, in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&Value>> {
        let idx = self.schema.index_of(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Create a new table from the rows at `indices`, in the given order.
    ///
    /// Out-of-range indices are ignored.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let rows = indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Return a table where `name` holds `value` on every row.
    ///
    /// An existing column of that name is overwritten in place; otherwise the column is appended.
    pub fn with_constant_column(&self, name: &str, value: &Value) -> Self {
        let mut out = self.clone();
        match out.schema.index_of(name) {
            Some(idx) => out.rows.iter_mut().for_each(|r| r[idx] = value.clone()),
            None => {
                out.schema.columns.push(name.to_string());
                out.rows.iter_mut().for_each(|r| r.push(value.clone()));
            }
        }
        out
    }

    /// Return a table with every cell converted to [`Value::Utf8`] via its [`Display`](fmt::Display) form.
    pub fn stringify(self) -> Self {
        let rows = self
            .rows
            .into_iter()
            .map(|row| row.into_iter().map(|v| Value::Utf8(v.into_text())).collect())
            .collect();
        Self {
            schema: self.schema,
            rows,
        }
    }

    /// Return a table without exact duplicate rows, keeping first occurrences in order.
    pub fn dedup_rows(&self) -> Self {
        let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(self.rows.len());
        let keep: Vec<bool> = self
            .rows
            .iter()
            .map(|row| seen.insert(row.iter().map(Value::key).collect()))
            .collect();
        let rows = self
            .rows
            .iter()
            .zip(keep)
            .filter_map(|(row, k)| k.then(|| row.clone()))
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Return a table without the columns whose every value is null.
    pub fn drop_null_columns(&self) -> Self {
        let keep: Vec<usize> = (0..self.schema.len())
            .filter(|&idx| self.rows.iter().any(|r| !r[idx].is_null()))
            .collect();
        let schema = Schema::new(keep.iter().map(|&i| self.schema.columns[i].clone()));
        let rows = self
            .rows
            .iter()
            .map(|r| keep.iter().map(|&i| r[i].clone()).collect())
            .collect();
        Self { schema, rows }
    }
}
