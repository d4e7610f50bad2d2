use thiserror::Error;

/// Convenience result type for remap operations.
pub type RemapResult<T> = Result<T, RemapError>;

/// Error type returned across ingestion, config loading and normalization.
///
/// Malformed-but-recognizable configs (missing `conditions`/`mapping`) are not errors: the
/// normalizer returns an empty table for them. Errors here indicate I/O failures, unparsable
/// inputs, or rules whose shape cannot be interpreted at all.
#[derive(Debug, Error)]
pub enum RemapError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse/serialize error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parse error.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV read/write error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The batch worker pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The input does not have the expected shape (non-object records, ragged rows, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A condition spec is neither a scalar, `null`, `"not null"`, nor a list of scalars.
    #[error("invalid condition format for column '{column}': {message}")]
    InvalidConditionFormat { column: String, message: String },

    /// A config section could not be converted to its typed form.
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },

    /// Required provider connection arguments were not supplied.
    #[error("missing connection arguments for {provider}: {}", .missing.join(", "))]
    MissingConnectionArgs {
        provider: String,
        missing: Vec<String>,
    },
}
