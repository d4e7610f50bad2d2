//! Row filtering by [`ConditionSet`].

use std::collections::HashSet;

use crate::config::ConditionSet;
use crate::types::Table;

use super::condition::matching_rows;

/// Returns the indices of rows selected by `conditions`.
///
/// - [`ConditionSet::All`] selects every row in order.
/// - [`ConditionSet::Single`] selects the rows matching that AND-group.
/// - [`ConditionSet::AnyOf`] evaluates every group against the original table and concatenates
///   the matches in group order, skipping rows an earlier group already selected.
pub fn select_rows(table: &Table, conditions: &ConditionSet) -> Vec<usize> {
    match conditions {
        ConditionSet::All => (0..table.row_count()).collect(),
        ConditionSet::Single(condition) => matching_rows(table, condition),
        ConditionSet::AnyOf(groups) => {
            let mut seen = HashSet::new();
            groups
                .iter()
                .flat_map(|condition| matching_rows(table, condition))
                .filter(|row| seen.insert(*row))
                .collect()
        }
    }
}

/// Returns a new [`Table`] containing only rows selected by `conditions`.
///
/// The returned table preserves the original schema.
pub fn filter(table: &Table, conditions: &ConditionSet) -> Table {
    match conditions {
        ConditionSet::All => table.clone(),
        _ => table.select_rows(&select_rows(table, conditions)),
    }
}
