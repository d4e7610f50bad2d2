//! The filter → extend → map → stringify → dedupe pipeline.

use tracing::{debug, warn};

use crate::config::{is_valid, NormalizationConfig};
use crate::error::RemapResult;
use crate::types::Table;

use super::filter::filter;
use super::map::map_fields;

/// Normalize `table` with a typed config.
///
/// 1. keep rows selected by `config.conditions` (an empty selection is returned as is)
/// 2. add every extension literal as a column on every row
/// 3. translate columns with `config.mapping` (sources are not preserved)
/// 4. convert every cell to [`Value::Utf8`](crate::types::Value::Utf8)
/// 5. drop exact duplicate rows, keeping the first occurrence
pub fn normalize(table: &Table, config: &NormalizationConfig) -> Table {
    let filtered = filter(table, &config.conditions);
    debug!(
        input_rows = table.row_count(),
        matched_rows = filtered.row_count(),
        "filtered rows"
    );
    if filtered.is_empty() {
        return filtered;
    }

    let extended = config
        .extensions
        .entries()
        .fold(filtered, |acc, (column, value)| acc.with_constant_column(column, value));

    let out = map_fields(&extended, &config.mapping, false)
        .stringify()
        .dedup_rows();
    debug!(
        output_rows = out.row_count(),
        columns = out.schema.len(),
        "normalized table"
    );
    out
}

/// Normalize `table` with a loosely typed config.
///
/// A config failing [`is_valid`] yields an empty table rather than an error, so that a batch
/// of heterogeneous configs is not aborted by one bad entry. Condition specs that cannot be
/// interpreted are reported as
/// [`RemapError::InvalidConditionFormat`](crate::error::RemapError::InvalidConditionFormat).
pub fn normalize_value(table: &Table, config: &serde_json::Value) -> RemapResult<Table> {
    if !is_valid(config) {
        warn!("config lacks 'conditions'/'mapping' or has non-string mapping targets; skipping");
        return Ok(Table::empty());
    }
    let config = NormalizationConfig::from_value(config)?;
    Ok(normalize(table, &config))
}
