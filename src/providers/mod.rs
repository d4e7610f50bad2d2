//! Query providers that produce raw records for normalization.
//!
//! Network clients live outside this crate. A provider is modeled as:
//! - a [`ProviderKind`] describing its connection arguments and query defaults
//! - [`ConnectArgs`] resolved from settings, a connection string, or overrides
//! - a [`RecordSource`] implementation that returns a [`RecordBatch`] for a [`QueryRequest`]
//!
//! [`query_table`] turns a source's records into a [`Table`] ready for
//! [`crate::processing::normalize`].

mod connect;

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::error::{RemapError, RemapResult};
use crate::ingestion::{flatten_records, table_from_split, FlattenOptions};
use crate::types::Table;

pub use connect::{provider_settings, ConnectArgs};

/// Event fields the events provider never requests.
pub const EXCLUDED_EVENT_FIELDS: &[&str] = &[
    "_meta",
    "assets",
    "attacking_assets",
    "incident.aggregation.closed_behavior",
    "incident.aggregation.key",
    "incident.aggregation.time_window",
    "incident.aggregation.timeout",
    "incident.assigned_to_user_id",
    "incident.category",
    "incident.description",
    "incident.name",
    "incident.severity",
    "incident.severity_behavior",
    "subevents.time",
];

const SIEM_ARGS: &[(&str, &str)] = &[
    ("host", "(string) The host name."),
    (
        "http_scheme",
        "('https' or 'http') The scheme for accessing the service (the default is 'https').",
    ),
    (
        "verify",
        "(bool) Enable or disable TLS verification for https connections (the default is false).",
    ),
    ("username", "(string) The account username used to authenticate."),
    ("password", "(string) The password for the account."),
];

const NAD_ARGS: &[(&str, &str)] = &[
    ("host", "(string) The host name."),
    (
        "verify",
        "(bool) Enable or disable TLS verification for https connections (the default is false).",
    ),
    ("stg_idx", "(string) Storage index (the default is '2')."),
    ("username", "(string) The account username used to authenticate."),
    ("password", "(string) The password for the account."),
];

const REQUIRED_ARGS: &[&str] = &["host", "username", "password"];

/// The query providers whose results this crate normalizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// SIEM raw event queries.
    MpSiem,
    /// SIEM PDQL event queries with field selection and paging.
    MpSiemEvents,
    /// SIEM incident listings.
    MpSiemIncidents,
    /// Network traffic analyzer flow queries.
    PtNad,
}

impl ProviderKind {
    /// Known connection arguments with their descriptions.
    pub fn connect_args(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::PtNad => NAD_ARGS,
            _ => SIEM_ARGS,
        }
    }

    pub fn arg_names(self) -> impl Iterator<Item = &'static str> {
        self.connect_args().iter().map(|(name, _)| *name)
    }

    pub fn is_known_arg(self, name: &str) -> bool {
        self.arg_names().any(|n| n == name)
    }

    pub fn required_args(self) -> &'static [&'static str] {
        REQUIRED_ARGS
    }

    /// Default values applied before settings and caller input.
    pub fn defaults(self) -> Vec<(&'static str, serde_json::Value)> {
        let mut out = vec![
            ("http_scheme", serde_json::Value::from("https")),
            ("verify", serde_json::Value::Bool(false)),
        ];
        if self == Self::PtNad {
            out.push(("stg_idx", serde_json::Value::from("2")));
        }
        out
    }

    /// Name of the `DataProviders` settings section.
    pub fn settings_section(self) -> &'static str {
        match self {
            Self::PtNad => "PTNAD",
            _ => "MPSIEM",
        }
    }

    /// Row limit applied when a request does not set one. Incident listings are unbounded.
    pub fn default_limit(self) -> Option<usize> {
        match self {
            Self::MpSiem | Self::MpSiemEvents => Some(500),
            Self::MpSiemIncidents => None,
            Self::PtNad => Some(5000),
        }
    }

    /// Flattening used for this provider's records.
    pub fn flatten_options(self) -> FlattenOptions {
        let mut opts = FlattenOptions::default();
        if self == Self::MpSiemEvents {
            opts.exclude = EXCLUDED_EVENT_FIELDS.iter().map(|s| s.to_string()).collect();
        }
        opts
    }

    /// Filter a provider's advertised field list down to the fields worth requesting.
    pub fn selectable_fields<'a>(self, available: &[&'a str]) -> Vec<&'a str> {
        available
            .iter()
            .copied()
            .filter(|f| self != Self::MpSiemEvents || !EXCLUDED_EVENT_FIELDS.iter().any(|e| e == f))
            .collect()
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MpSiem => "MPSIEM",
            Self::MpSiemEvents => "MPSIEM Events",
            Self::MpSiemIncidents => "MPSIEM Incidents",
            Self::PtNad => "PTNAD",
        };
        f.write_str(name)
    }
}

/// Inclusive time window of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    start: SystemTime,
    end: SystemTime,
}

impl QueryWindow {
    /// A window from `start` to `end`; `start` must not be after `end`.
    pub fn new(start: SystemTime, end: SystemTime) -> RemapResult<Self> {
        if start > end {
            return Err(RemapError::InvalidConfig {
                message: "query window start is after its end".to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// The `span` leading up to `end`.
    pub fn ending_at(end: SystemTime, span: Duration) -> Self {
        let start = end.checked_sub(span).unwrap_or(UNIX_EPOCH);
        Self { start, end }
    }

    /// The hour leading up to now.
    pub fn last_hour() -> Self {
        Self::ending_at(SystemTime::now(), Duration::from_secs(3600))
    }

    pub fn start(&self) -> SystemTime {
        self.start
    }

    pub fn end(&self) -> SystemTime {
        self.end
    }

    pub fn start_epoch_secs(&self) -> i64 {
        epoch_secs(self.start)
    }

    pub fn end_epoch_secs(&self) -> i64 {
        epoch_secs(self.end)
    }
}

impl Default for QueryWindow {
    fn default() -> Self {
        Self::last_hour()
    }
}

/// Seconds since the epoch, rounded to the nearest second.
fn epoch_secs(t: SystemTime) -> i64 {
    fn rounded(d: Duration) -> i64 {
        let secs = d.as_secs() as i64;
        if d.subsec_nanos() >= 500_000_000 { secs + 1 } else { secs }
    }
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => rounded(d),
        Err(e) => -rounded(e.duration()),
    }
}

/// A query to run against a [`RecordSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    pub window: QueryWindow,
    /// Maximum number of records; `None` means unbounded.
    pub limit: Option<usize>,
    /// Records to skip before the first one returned.
    pub offset: usize,
}

impl QueryRequest {
    /// A request over the last hour with the provider's default limit.
    pub fn new(kind: ProviderKind, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            window: QueryWindow::last_hour(),
            limit: kind.default_limit(),
            offset: 0,
        }
    }

    pub fn with_window(mut self, window: QueryWindow) -> Self {
        self.window = window;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// Raw query output.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBatch {
    /// One JSON object per record, possibly nested.
    Records(Vec<serde_json::Value>),
    /// A column list plus one JSON array per row.
    Split {
        columns: Vec<String>,
        data: Vec<serde_json::Value>,
    },
}

impl RecordBatch {
    pub fn len(&self) -> usize {
        match self {
            Self::Records(r) => r.len(),
            Self::Split { data, .. } => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anything that can answer a [`QueryRequest`] with records.
pub trait RecordSource: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn fetch(&self, request: &QueryRequest) -> RemapResult<RecordBatch>;
}

/// Run `request` against `source` and flatten the result into a [`Table`].
///
/// An empty result is not an error: it is logged and returned as [`Table::empty`].
pub fn query_table<S>(source: &S, request: &QueryRequest, options: &FlattenOptions) -> RemapResult<Table>
where
    S: RecordSource + ?Sized,
{
    debug!(
        provider = %source.kind(),
        query = %request.query,
        limit = ?request.limit,
        offset = request.offset,
        start = request.window.start_epoch_secs(),
        end = request.window.end_epoch_secs(),
        "running query"
    );
    let batch = source.fetch(request)?;
    if batch.is_empty() {
        warn!(provider = %source.kind(), query = %request.query, "query did not return any results");
        return Ok(Table::empty());
    }

    match batch {
        RecordBatch::Records(records) => flatten_records(&records, options),
        RecordBatch::Split { columns, data } => table_from_split(&columns, &data),
    }
}

/// Serves canned records, applying the request's offset and limit.
///
/// The query text and time window are not interpreted.
#[derive(Debug, Clone)]
pub struct StaticSource {
    kind: ProviderKind,
    records: Vec<serde_json::Value>,
}

impl StaticSource {
    pub fn new(kind: ProviderKind, records: Vec<serde_json::Value>) -> Self {
        Self { kind, records }
    }
}

impl RecordSource for StaticSource {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn fetch(&self, request: &QueryRequest) -> RemapResult<RecordBatch> {
        let page = self
            .records
            .iter()
            .skip(request.offset)
            .take(request.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(RecordBatch::Records(page))
    }
}

/// Render query parameters as a quoted, comma-joined list: `"a","b"`.
pub fn format_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: fmt::Display,
{
    items
        .into_iter()
        .map(|item| format!("\"{item}\""))
        .collect::<Vec<_>>()
        .join(",")
}
