//! Normalization configs.
//!
//! A config describes which rows to keep (`conditions`), which literal columns to add
//! (`extensions`) and how to rename columns (`mapping`). Configs usually arrive loosely typed
//! (JSON or YAML); [`is_valid`] performs the fail-soft shape check and
//! [`NormalizationConfig::from_value`] builds the typed form once, rejecting condition specs
//! it cannot interpret.
//!
//! ```rust
//! use record_remap::config::{is_valid, NormalizationConfig};
//!
//! let raw = serde_json::json!({
//!     "conditions": {"status": "active"},
//!     "extensions": {"source": "siem"},
//!     "mapping": {"id": "ID", "src_ip": ["SourceIp", "Ip"]}
//! });
//! assert!(is_valid(&raw));
//! let config = NormalizationConfig::from_value(&raw).unwrap();
//! assert_eq!(config.mapping.len(), 2);
//! ```

pub mod loader;

use serde::Deserialize;

use crate::error::{RemapError, RemapResult};
use crate::types::Value;

pub use loader::{load_config_dir, load_config_set, ConfigFormat, ConfigSet};

/// Literal that selects rows whose value is present.
pub const NOT_NULL_MARKER: &str = "not null";

/// Condition-set literal that matches every row.
pub const WILDCARD: &str = "*";

/// How a single column is matched.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionSpec {
    /// Exact equality, no type coercion.
    Equals(Value),
    /// Value is null/absent.
    IsNull,
    /// Value is present.
    IsNotNull,
    /// Value equals any listed literal; null cells never match.
    OneOf(Vec<Value>),
}

impl ConditionSpec {
    /// Interpret a loosely typed spec for `column`.
    pub fn from_json(column: &str, v: &serde_json::Value) -> RemapResult<Self> {
        match v {
            serde_json::Value::Null => Ok(Self::IsNull),
            serde_json::Value::String(s) if s == NOT_NULL_MARKER => Ok(Self::IsNotNull),
            // A null entry can never equal a cell, so it is dropped.
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| match Value::from_json_scalar(item) {
                    Some(Value::Null) => None,
                    Some(value) => Some(Ok(value)),
                    None => Some(Err(RemapError::InvalidConditionFormat {
                        column: column.to_string(),
                        message: format!("list entries must be scalars, got {item}"),
                    })),
                })
                .collect::<RemapResult<Vec<_>>>()
                .map(Self::OneOf),
            other => Value::from_json_scalar(other).map(Self::Equals).ok_or_else(|| {
                RemapError::InvalidConditionFormat {
                    column: column.to_string(),
                    message: format!("unexpected condition value {other}"),
                }
            }),
        }
    }

    /// Returns `true` if a single cell `value` satisfies this spec.
    ///
    /// Row selection goes through this for every spec. `OneOf` rows are additionally
    /// ordered by the position of the listed value they equal.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Equals(expected) => !value.is_null() && value == expected,
            Self::IsNull => value.is_null(),
            Self::IsNotNull => !value.is_null(),
            Self::OneOf(values) => !value.is_null() && values.contains(value),
        }
    }
}

/// Column-keyed match rules combined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    clauses: Vec<(String, ConditionSpec)>,
}

impl Condition {
    /// An empty condition (matches every row).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a clause (builder style).
    pub fn and(mut self, column: impl Into<String>, spec: ConditionSpec) -> Self {
        self.clauses.push((column.into(), spec));
        self
    }

    /// Clauses in config order.
    pub fn clauses(&self) -> impl Iterator<Item = (&str, &ConditionSpec)> {
        self.clauses.iter().map(|(c, s)| (c.as_str(), s))
    }

    fn from_json(v: &serde_json::Value) -> RemapResult<Self> {
        let obj = v.as_object().ok_or_else(|| RemapError::InvalidConditionFormat {
            column: "conditions".to_string(),
            message: format!("expected an object of column conditions, got {v}"),
        })?;
        let clauses = obj
            .iter()
            .map(|(column, spec)| Ok((column.clone(), ConditionSpec::from_json(column, spec)?)))
            .collect::<RemapResult<Vec<_>>>()?;
        Ok(Self { clauses })
    }
}

/// Row selection rule.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionSet {
    /// Wildcard: every row.
    All,
    /// One AND-group.
    Single(Condition),
    /// OR across AND-groups, each evaluated against the original table.
    AnyOf(Vec<Condition>),
}

impl ConditionSet {
    /// Interpret the loosely typed `conditions` section.
    pub fn from_json(v: &serde_json::Value) -> RemapResult<Self> {
        match v {
            serde_json::Value::String(s) if s == WILDCARD => Ok(Self::All),
            serde_json::Value::Object(_) => Condition::from_json(v).map(Self::Single),
            serde_json::Value::Array(items) => items
                .iter()
                .map(Condition::from_json)
                .collect::<RemapResult<Vec<_>>>()
                .map(Self::AnyOf),
            other => Err(RemapError::InvalidConditionFormat {
                column: "conditions".to_string(),
                message: format!("expected \"*\", an object or a list of objects, got {other}"),
            }),
        }
    }
}

/// Destination of a mapped column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldTarget {
    /// 1:1 rename.
    Rename(String),
    /// Copy the source into every listed column.
    FanOut(Vec<String>),
}

/// Ordered source → destination translation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping {
    entries: Vec<(String, FieldTarget)>,
}

impl FieldMapping {
    /// An empty mapping (columns pass through unchanged).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rename entry (builder style).
    pub fn rename(mut self, source: impl Into<String>, destination: impl Into<String>) -> Self {
        self.entries
            .push((source.into(), FieldTarget::Rename(destination.into())));
        self
    }

    /// Add a fan-out entry (builder style).
    pub fn fan_out<I, S>(mut self, source: impl Into<String>, destinations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dests = destinations.into_iter().map(Into::into).collect();
        self.entries.push((source.into(), FieldTarget::FanOut(dests)));
        self
    }

    /// Entries in config order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldTarget)> {
        self.entries.iter().map(|(s, t)| (s.as_str(), t))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interpret the loosely typed `mapping` section.
    pub fn from_json(v: &serde_json::Value) -> RemapResult<Self> {
        let obj = v.as_object().ok_or_else(|| RemapError::InvalidConfig {
            message: format!("mapping must be an object, got {v}"),
        })?;
        let mut entries = Vec::with_capacity(obj.len());
        for (source, target) in obj {
            let target = match target {
                serde_json::Value::String(s) => FieldTarget::Rename(s.clone()),
                serde_json::Value::Array(items) => FieldTarget::FanOut(
                    items
                        .iter()
                        .map(|i| {
                            i.as_str().map(str::to_string).ok_or_else(|| {
                                RemapError::InvalidConfig {
                                    message: format!(
                                        "mapping '{source}' must list strings, got {i}"
                                    ),
                                }
                            })
                        })
                        .collect::<RemapResult<Vec<_>>>()?,
                ),
                other => {
                    return Err(RemapError::InvalidConfig {
                        message: format!(
                            "mapping '{source}' must be a string or list of strings, got {other}"
                        ),
                    })
                }
            };
            entries.push((source.clone(), target));
        }
        Ok(Self { entries })
    }
}

/// Literal columns added to every surviving row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extensions {
    entries: Vec<(String, Value)>,
}

impl Extensions {
    /// No literal columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a literal column (builder style).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((column.into(), value.into()));
        self
    }

    /// Literal columns in config order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Returns `true` if no literal columns are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Interpret the loosely typed `extensions` section; `null` means no extensions.
    pub fn from_json(v: &serde_json::Value) -> RemapResult<Self> {
        if v.is_null() {
            return Ok(Self::default());
        }
        let obj = v.as_object().ok_or_else(|| RemapError::InvalidConfig {
            message: format!("extensions must be an object, got {v}"),
        })?;
        let entries = obj
            .iter()
            .map(|(column, literal)| {
                Value::from_json_scalar(literal)
                    .map(|value| (column.clone(), value))
                    .ok_or_else(|| RemapError::InvalidConfig {
                        message: format!("extension '{column}' must be a scalar, got {literal}"),
                    })
            })
            .collect::<RemapResult<Vec<_>>>()?;
        Ok(Self { entries })
    }
}

/// Typed normalization config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct NormalizationConfig {
    pub conditions: ConditionSet,
    pub mapping: FieldMapping,
    pub extensions: Extensions,
}

impl NormalizationConfig {
    /// Create a config without extensions.
    pub fn new(conditions: ConditionSet, mapping: FieldMapping) -> Self {
        Self {
            conditions,
            mapping,
            extensions: Extensions::default(),
        }
    }

    /// Set the extensions (builder style).
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// Build the typed form of a loosely typed config.
    ///
    /// Unlike [`is_valid`], this reports why a config is unusable. Unsupported condition
    /// shapes are [`RemapError::InvalidConditionFormat`]; other shape problems are
    /// [`RemapError::InvalidConfig`].
    pub fn from_value(v: &serde_json::Value) -> RemapResult<Self> {
        let obj = v.as_object().ok_or_else(|| RemapError::InvalidConfig {
            message: "config must be an object".to_string(),
        })?;
        let conditions = obj.get("conditions").ok_or_else(|| RemapError::InvalidConfig {
            message: "missing 'conditions' section".to_string(),
        })?;
        let mapping = obj.get("mapping").ok_or_else(|| RemapError::InvalidConfig {
            message: "missing 'mapping' section".to_string(),
        })?;
        Ok(Self {
            conditions: ConditionSet::from_json(conditions)?,
            mapping: FieldMapping::from_json(mapping)?,
            extensions: obj
                .get("extensions")
                .map(Extensions::from_json)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

impl TryFrom<serde_json::Value> for NormalizationConfig {
    type Error = RemapError;

    fn try_from(v: serde_json::Value) -> Result<Self, Self::Error> {
        Self::from_value(&v)
    }
}

/// Fail-soft shape check for a loosely typed config.
///
/// Returns `false` if `conditions` is missing or is not `"*"`, an object or a list, if
/// `mapping` is missing, or if any mapping value is not a string or a list of strings.
/// Never fails; per-column condition specs are not inspected here.
pub fn is_valid(config: &serde_json::Value) -> bool {
    let Some(obj) = config.as_object() else {
        return false;
    };
    match obj.get("conditions") {
        Some(serde_json::Value::String(s)) if s == WILDCARD => {}
        Some(serde_json::Value::Object(_) | serde_json::Value::Array(_)) => {}
        _ => return false,
    }
    let Some(mapping) = obj.get("mapping").and_then(|m| m.as_object()) else {
        return false;
    };
    mapping.values().all(|target| match target {
        serde_json::Value::String(_) => true,
        serde_json::Value::Array(items) => items.iter().all(|i| i.is_string()),
        _ => false,
    })
}
