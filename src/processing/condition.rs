//! Evaluation of a single AND-group [`Condition`] against a [`Table`].

use tracing::trace;

use crate::config::{Condition, ConditionSpec};
use crate::types::Table;

/// Returns the indices of rows satisfying every clause of `condition`.
///
/// Each clause narrows the selection left by the previous one. A clause on a column the table
/// does not have selects nothing. For [`ConditionSpec::OneOf`] the result is the union of the
/// per-value matches, in list order, without repeating a row.
pub fn matching_rows(table: &Table, condition: &Condition) -> Vec<usize> {
    let mut selected: Vec<usize> = (0..table.row_count()).collect();

    for (column, spec) in condition.clauses() {
        let Some(idx) = table.schema.index_of(column) else {
            trace!(column, "condition column not in table; no rows match");
            return Vec::new();
        };

        selected.retain(|&row| spec.matches(&table.rows[row][idx]));
        if let ConditionSpec::OneOf(values) = spec {
            // Stable: rows equal to the same listed value stay in table order.
            selected.sort_by_key(|&row| values.iter().position(|v| *v == table.rows[row][idx]));
        }

        if selected.is_empty() {
            break;
        }
    }

    selected
}

/// Returns a new [`Table`] with the rows satisfying `condition`.
pub fn filter_condition(table: &Table, condition: &Condition) -> Table {
    table.select_rows(&matching_rows(table, condition))
}

#[cfg(test)]
mod tests {
    use super::{filter_condition, matching_rows};
    use crate::config::{Condition, ConditionSpec};
    use crate::types::{Schema, Table, Value};

    fn a_table() -> Table {
        Table::new(
            Schema::new(["a"]),
            vec![vec![Value::Int64(1)], vec![Value::Int64(2)], vec![Value::Null]],
        )
    }

    #[test]
    fn not_null_keeps_present_values() {
        let out = filter_condition(&a_table(), &Condition::new().and("a", ConditionSpec::IsNotNull));
        assert_eq!(out.rows, vec![vec![Value::Int64(1)], vec![Value::Int64(2)]]);
    }

    #[test]
    fn null_keeps_missing_values() {
        let out = filter_condition(&a_table(), &Condition::new().and("a", ConditionSpec::IsNull));
        assert_eq!(out.rows, vec![vec![Value::Null]]);
    }

    #[test]
    fn one_of_is_a_union_in_list_order() {
        let t = a_table();
        let c = Condition::new().and(
            "a",
            ConditionSpec::OneOf(vec![Value::Int64(1), Value::Int64(2)]),
        );
        assert_eq!(
            filter_condition(&t, &c).rows,
            vec![vec![Value::Int64(1)], vec![Value::Int64(2)]]
        );

        let reversed = Condition::new().and(
            "a",
            ConditionSpec::OneOf(vec![Value::Int64(2), Value::Int64(1), Value::Int64(2)]),
        );
        assert_eq!(matching_rows(&t, &reversed), vec![1, 0]);
    }

    #[test]
    fn one_of_keeps_table_order_within_a_value() {
        let t = Table::new(
            Schema::new(["a"]),
            vec![
                vec![Value::from("x")],
                vec![Value::from("y")],
                vec![Value::from("x")],
                vec![Value::Null],
            ],
        );
        let c = Condition::new().and(
            "a",
            ConditionSpec::OneOf(vec![Value::from("y"), Value::from("x"), Value::Null]),
        );
        assert_eq!(matching_rows(&t, &c), vec![1, 0, 2]);
        assert!(!ConditionSpec::OneOf(vec![Value::Null]).matches(&Value::Null));
    }

    #[test]
    fn clauses_combine_with_and() {
        let t = Table::new(
            Schema::new(["status", "sev"]),
            vec![
                vec![Value::from("open"), Value::Int64(3)],
                vec![Value::from("open"), Value::Int64(1)],
                vec![Value::from("closed"), Value::Int64(3)],
            ],
        );
        let c = Condition::new()
            .and("status", ConditionSpec::Equals(Value::from("open")))
            .and("sev", ConditionSpec::Equals(Value::Int64(3)));
        assert_eq!(matching_rows(&t, &c), vec![0]);
    }

    #[test]
    fn absent_column_matches_nothing() {
        let c = Condition::new()
            .and("a", ConditionSpec::IsNotNull)
            .and("missing", ConditionSpec::IsNull);
        assert!(matching_rows(&a_table(), &c).is_empty());
    }

    #[test]
    fn empty_condition_matches_everything() {
        assert_eq!(matching_rows(&a_table(), &Condition::new()), vec![0, 1, 2]);
    }
}
