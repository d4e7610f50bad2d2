//! Loading named config sets from JSON/YAML files.
//!
//! A config file holds a map of named configs:
//!
//! ```yaml
//! failed_logon:
//!   conditions: {event_src.category: "Authentication", status: "failure"}
//!   extensions: {EventType: "logon"}
//!   mapping: {subject.name: "Account", src.ip: ["SourceIp", "Ip"]}
//! ```
//!
//! Entries are kept loosely typed so that one malformed entry does not prevent the others from
//! being loaded; the normalizer decides per entry.

use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{RemapError, RemapResult};

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Parse a config format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Ordered collection of named, loosely typed configs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSet {
    entries: Vec<(String, serde_json::Value)>,
}

impl ConfigSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named config.
    pub fn insert(&mut self, name: impl Into<String>, config: serde_json::Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = config,
            None => self.entries.push((name, config)),
        }
    }

    /// Look up a config by name.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Named configs in load order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Number of named configs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no configs are loaded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a config set from text in the given format.
    pub fn from_str_with_format(input: &str, format: ConfigFormat) -> RemapResult<Self> {
        let root: serde_json::Value = match format {
            ConfigFormat::Json => serde_json::from_str(input)?,
            ConfigFormat::Yaml => serde_yaml::from_str(input)?,
        };
        Self::from_value(root)
    }

    fn from_value(root: serde_json::Value) -> RemapResult<Self> {
        match root {
            serde_json::Value::Object(map) => Ok(Self {
                entries: map.into_iter().collect(),
            }),
            serde_json::Value::Null => Ok(Self::default()),
            other => Err(RemapError::InvalidConfig {
                message: format!("config set must map names to configs, got {other}"),
            }),
        }
    }

    fn prefixed(self, prefix: &str) -> impl Iterator<Item = (String, serde_json::Value)> {
        self.entries
            .into_iter()
            .map(move |(name, c)| (format!("{prefix}.{name}"), c))
    }
}

/// Load a config set from a file.
///
/// If `format` is `None`, the format is inferred from the file extension.
pub fn load_config_set(path: impl AsRef<Path>, format: Option<ConfigFormat>) -> RemapResult<ConfigSet> {
    let path = path.as_ref();
    let format = match format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };
    let text = fs::read_to_string(path)?;
    let set = ConfigSet::from_str_with_format(&text, format)?;
    debug!(path = %path.display(), configs = set.len(), "loaded config set");
    Ok(set)
}

/// Load every config file under `dir` (recursively), in sorted path order.
///
/// Entries are named `<file stem>.<config name>`. Files with unrecognized extensions are ignored.
pub fn load_config_dir(dir: impl AsRef<Path>) -> RemapResult<ConfigSet> {
    let mut out = ConfigSet::new();
    for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => RemapError::Io(io),
            None => RemapError::InvalidConfig {
                message: "filesystem loop while walking config directory".to_string(),
            },
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ConfigFormat::from_extension)
        else {
            continue;
        };
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        for (name, config) in load_config_set(path, Some(format))?.prefixed(&stem) {
            out.insert(name, config);
        }
    }
    Ok(out)
}

fn infer_format_from_path(path: &Path) -> RemapResult<ConfigFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| RemapError::InvalidConfig {
            message: format!(
                "cannot infer config format: path has no extension ({})",
                path.display()
            ),
        })?;

    ConfigFormat::from_extension(ext).ok_or_else(|| RemapError::InvalidConfig {
        message: format!(
            "cannot infer config format from extension '{ext}' for path ({})",
            path.display()
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::{ConfigFormat, ConfigSet};

    #[test]
    fn yaml_and_json_sets_keep_file_order() {
        let yaml = "
b_rule:
  conditions: '*'
  mapping: {x: X}
a_rule:
  conditions: {k: ~}
  mapping: {y: [Y1, Y2]}
";
        let set = ConfigSet::from_str_with_format(yaml, ConfigFormat::Yaml).unwrap();
        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b_rule", "a_rule"]);
        assert!(set.get("a_rule").unwrap()["conditions"]["k"].is_null());

        let json = r#"{"z": {"conditions": "*", "mapping": {}}, "a": {"mapping": {}}}"#;
        let set = ConfigSet::from_str_with_format(json, ConfigFormat::Json).unwrap();
        assert_eq!(set.iter().map(|(n, _)| n).collect::<Vec<_>>(), vec!["z", "a"]);
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = ConfigSet::from_str_with_format("[1, 2]", ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("config set must map names"));
    }

    #[test]
    fn insert_replaces_existing_name() {
        let mut set = ConfigSet::new();
        set.insert("a", serde_json::json!(1));
        set.insert("a", serde_json::json!(2));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn extension_inference() {
        assert_eq!(ConfigFormat::from_extension("YML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("toml"), None);
    }
}
