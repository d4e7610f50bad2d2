//! Connection argument resolution.
//!
//! Arguments are layered in this order, later layers winning:
//! 1. provider defaults
//! 2. the provider's `DataProviders.<section>.Args` settings
//! 3. either a `key=value;key=value` connection string, or explicit overrides
//!
//! Only the provider's known argument names survive into the resolved [`ConnectArgs`].

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, error};

use crate::error::{RemapError, RemapResult};

use super::ProviderKind;

const VERIFY: &str = "verify";

/// Resolved, validated connection arguments for one provider.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectArgs {
    kind: ProviderKind,
    values: BTreeMap<String, String>,
    verify: bool,
}

impl ConnectArgs {
    /// Merge defaults, settings, and caller input into validated arguments.
    ///
    /// `connection_str` takes precedence over `overrides`: when it is given, overrides are
    /// ignored. Override names must be known to the provider; unknown names in settings or the
    /// connection string are dropped.
    pub fn resolve(
        kind: ProviderKind,
        settings: Option<&serde_json::Map<String, serde_json::Value>>,
        connection_str: Option<&str>,
        overrides: &[(&str, serde_json::Value)],
    ) -> RemapResult<Self> {
        let mut merged: BTreeMap<String, serde_json::Value> = kind
            .defaults()
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();

        if let Some(settings) = settings {
            for (k, v) in settings {
                merged.insert(k.clone(), v.clone());
            }
        }

        match connection_str.filter(|s| !s.trim().is_empty()) {
            Some(cs) => {
                for (k, v) in parse_connection_str(cs)? {
                    merged.insert(k, serde_json::Value::String(v));
                }
            }
            None => {
                let unknown: Vec<&str> = overrides
                    .iter()
                    .map(|(k, _)| *k)
                    .filter(|k| !kind.is_known_arg(k))
                    .collect();
                if !unknown.is_empty() {
                    return Err(RemapError::InvalidConfig {
                        message: format!(
                            "unknown connection arguments for {kind}: {}; valid arguments are {}",
                            unknown.join(", "),
                            kind.arg_names().collect::<Vec<_>>().join(", ")
                        ),
                    });
                }
                for (k, v) in overrides {
                    merged.insert(k.to_string(), v.clone());
                }
            }
        }

        let missing: Vec<String> = kind
            .required_args()
            .iter()
            .filter(|name| merged.get(**name).is_none_or(serde_json::Value::is_null))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            let help = kind
                .connect_args()
                .iter()
                .map(|(arg, desc)| format!("{arg}: {desc}"))
                .collect::<Vec<_>>()
                .join("; ");
            error!(
                provider = %kind,
                missing = %missing.join(", "),
                required = %kind.required_args().join(", "),
                %help,
                "connection parameters missing"
            );
            return Err(RemapError::MissingConnectionArgs {
                provider: kind.to_string(),
                missing,
            });
        }

        let verify = merged.get(VERIFY).map(coerce_verify).transpose()?.unwrap_or(false);

        let mut values = BTreeMap::new();
        for (k, v) in merged {
            if k == VERIFY || !kind.is_known_arg(&k) {
                continue;
            }
            let text = arg_text(&k, &v)?;
            values.insert(k, text);
        }

        debug!(provider = %kind, args = ?values.keys().collect::<Vec<_>>(), verify, "resolved connection arguments");
        Ok(Self {
            kind,
            values,
            verify,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// Look up any resolved argument by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn host(&self) -> &str {
        self.get("host").unwrap_or_default()
    }

    pub fn username(&self) -> &str {
        self.get("username").unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        self.get("password").unwrap_or_default()
    }

    /// Whether TLS certificates should be verified.
    pub fn verify(&self) -> bool {
        self.verify
    }

    /// Storage index; only meaningful for PT NAD, which falls back to `"2"`.
    pub fn stg_idx(&self) -> Option<&str> {
        self.get("stg_idx")
    }

    pub fn http_scheme(&self) -> &str {
        self.get("http_scheme").unwrap_or("https")
    }

    /// `<scheme>://<host>`.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.http_scheme(), self.host())
    }
}

impl fmt::Debug for ConnectArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted: BTreeMap<&str, &str> = self
            .values
            .iter()
            .map(|(k, v)| (k.as_str(), if k == "password" { "***" } else { v.as_str() }))
            .collect();
        f.debug_struct("ConnectArgs")
            .field("kind", &self.kind)
            .field("values", &redacted)
            .field("verify", &self.verify)
            .finish()
    }
}

/// Look up `DataProviders.<section>.Args` for `kind` in a settings document.
pub fn provider_settings(
    root: &serde_json::Value,
    kind: ProviderKind,
) -> Option<&serde_json::Map<String, serde_json::Value>> {
    root.get("DataProviders")?
        .get(kind.settings_section())?
        .get("Args")?
        .as_object()
}

/// Split `key=value;key=value` into pairs.
///
/// Keys are trimmed, values are kept verbatim and may themselves contain `=`.
fn parse_connection_str(cs: &str) -> RemapResult<Vec<(String, String)>> {
    cs.split(';')
        .filter(|item| !item.trim().is_empty())
        .map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| RemapError::InvalidConfig {
                    message: format!("connection string item '{}' is not key=value", item.trim()),
                })
        })
        .collect()
}

/// Text containing "true" (any case) enables verification.
fn coerce_verify(v: &serde_json::Value) -> RemapResult<bool> {
    match v {
        serde_json::Value::Bool(b) => Ok(*b),
        serde_json::Value::String(s) => Ok(s.to_lowercase().contains("true")),
        serde_json::Value::Null => Ok(false),
        other => Err(RemapError::InvalidConfig {
            message: format!("'verify' must be a bool or string, got {other}"),
        }),
    }
}

fn arg_text(name: &str, v: &serde_json::Value) -> RemapResult<String> {
    match v {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(RemapError::InvalidConfig {
            message: format!("connection argument '{name}' must be a scalar, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{provider_settings, ConnectArgs};
    use crate::error::RemapError;
    use crate::providers::ProviderKind;

    fn settings_doc() -> serde_json::Value {
        json!({
            "DataProviders": {
                "MPSIEM": {"Args": {"host": "siem.local", "username": "svc", "password": "pw", "verify": "True"}},
                "PTNAD": {"Args": {"host": "nad.local", "username": "nad", "password": "pw2"}}
            }
        })
    }

    #[test]
    fn settings_fill_required_arguments_and_defaults_apply() {
        let doc = settings_doc();
        let args = ConnectArgs::resolve(
            ProviderKind::MpSiem,
            provider_settings(&doc, ProviderKind::MpSiem),
            None,
            &[],
        )
        .unwrap();
        assert_eq!(args.host(), "siem.local");
        assert_eq!(args.http_scheme(), "https");
        assert!(args.verify());
        assert_eq!(args.base_url(), "https://siem.local");
    }

    #[test]
    fn connection_string_overrides_settings_and_ignores_overrides() {
        let doc = settings_doc();
        let args = ConnectArgs::resolve(
            ProviderKind::MpSiemEvents,
            provider_settings(&doc, ProviderKind::MpSiemEvents),
            Some("host=other.local; http_scheme=http;verify=false;token=a=b"),
            &[("nonsense", json!("ignored"))],
        )
        .unwrap();
        assert_eq!(args.base_url(), "http://other.local");
        assert!(!args.verify());
        assert_eq!(args.get("token"), None);
    }

    #[test]
    fn overrides_must_be_known_arguments() {
        let err = ConnectArgs::resolve(
            ProviderKind::MpSiem,
            None,
            None,
            &[("host", json!("h")), ("hostname", json!("h"))],
        )
        .unwrap_err();
        assert!(matches!(err, RemapError::InvalidConfig { .. }));
        assert!(err.to_string().contains("hostname"));
    }

    #[test]
    fn missing_required_arguments_are_reported_in_order() {
        let err = ConnectArgs::resolve(ProviderKind::MpSiemIncidents, None, None, &[("host", json!("h"))])
            .unwrap_err();
        match err {
            RemapError::MissingConnectionArgs { provider, missing } => {
                assert_eq!(provider, "MPSIEM Incidents");
                assert_eq!(missing, vec!["username".to_string(), "password".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn ptnad_defaults_storage_index_and_drops_unknown_settings() {
        let doc = settings_doc();
        let args = ConnectArgs::resolve(
            ProviderKind::PtNad,
            provider_settings(&doc, ProviderKind::PtNad),
            None,
            &[("verify", json!(true))],
        )
        .unwrap();
        assert_eq!(args.stg_idx(), Some("2"));
        assert_eq!(args.get("http_scheme"), None);
        assert!(args.verify());
        assert_eq!(args.username(), "nad");
    }

    #[test]
    fn debug_output_redacts_password() {
        let args = ConnectArgs::resolve(
            ProviderKind::MpSiem,
            None,
            Some("host=h;username=u;password=hunter2"),
            &[],
        )
        .unwrap();
        let dbg = format!("{args:?}");
        assert!(!dbg.contains("hunter2"));
        assert_eq!(args.password(), "hunter2");
    }

    #[test]
    fn malformed_connection_string_item_is_invalid_config() {
        let err = ConnectArgs::resolve(ProviderKind::MpSiem, None, Some("host"), &[]).unwrap_err();
        assert!(matches!(err, RemapError::InvalidConfig { .. }));
    }
}
