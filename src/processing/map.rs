//! Column renaming and fan-out by [`FieldMapping`].

use crate::config::{FieldMapping, FieldTarget};
use crate::types::{Schema, Table, Value};

/// Returns a new [`Table`] with columns translated according to `mapping`.
///
/// Renames are applied first, all at once against the input schema, then fan-outs:
///
/// - Rename without `preserve_original`: every source column takes its destination name in
///   place, so swaps and chains keep all values. When several sources target one name, the
///   last entry in mapping order wins. A column that is not renamed away is dropped if a
///   rename targets its name.
/// - Rename with `preserve_original`: the input values of each source are copied into the
///   destination, which is overwritten in place or appended.
/// - Fan-out: every destination is overwritten or appended with the source values; without
///   `preserve_original` the source column is then removed unless it is itself a destination.
///
/// Entries whose source column is absent are skipped.
pub fn map_fields(table: &Table, mapping: &FieldMapping, preserve_original: bool) -> Table {
    let mut cols = Columns::from_table(table);

    let renames: Vec<(&str, &str)> = mapping
        .entries()
        .filter_map(|(source, target)| match target {
            FieldTarget::Rename(dest) => Some((source, dest.as_str())),
            FieldTarget::FanOut(_) => None,
        })
        .collect();
    if preserve_original {
        let copies: Vec<(&str, Vec<Value>)> = renames
            .iter()
            .filter_map(|&(source, dest)| cols.values(source).map(|v| (dest, v.to_vec())))
            .collect();
        for (dest, values) in copies {
            cols.set(dest, values);
        }
    } else {
        cols.rename_all(&renames);
    }

    for (source, target) in mapping.entries() {
        if let FieldTarget::FanOut(dests) = target {
            let Some(values) = cols.values(source).map(<[Value]>::to_vec) else {
                continue;
            };
            for dest in dests {
                cols.set(dest, values.clone());
            }
            if !preserve_original && !dests.iter().any(|d| d == source) {
                cols.remove(source);
            }
        }
    }

    cols.into_table()
}

/// Column-major working copy; renames and deletions touch one vector instead of every row.
struct Columns {
    names: Vec<String>,
    data: Vec<Vec<Value>>,
    row_count: usize,
}

impl Columns {
    fn from_table(table: &Table) -> Self {
        let names: Vec<String> = table.schema.field_names().map(str::to_string).collect();
        let mut data: Vec<Vec<Value>> = names
            .iter()
            .map(|_| Vec::with_capacity(table.row_count()))
            .collect();
        for row in &table.rows {
            for (col, v) in data.iter_mut().zip(row) {
                col.push(v.clone());
            }
        }
        Self {
            names,
            data,
            row_count: table.row_count(),
        }
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn values(&self, name: &str) -> Option<&[Value]> {
        self.index(name).map(|i| self.data[i].as_slice())
    }

    fn set(&mut self, name: &str, values: Vec<Value>) {
        match self.index(name) {
            Some(i) => self.data[i] = values,
            None => {
                self.names.push(name.to_string());
                self.data.push(values);
            }
        }
    }

    fn remove(&mut self, name: &str) {
        if let Some(i) = self.index(name) {
            self.names.remove(i);
            self.data.remove(i);
        }
    }

    /// Applies every `(from, to)` pair against the current names in one pass.
    fn rename_all(&mut self, renames: &[(&str, &str)]) {
        // Index into `renames` of the entry applied to each column; later entries win.
        let plan: Vec<Option<usize>> = self
            .names
            .iter()
            .map(|name| renames.iter().rposition(|(from, _)| from == name))
            .collect();
        let target = |col: usize| plan[col].map(|k| renames[k].1);

        let keep: Vec<bool> = (0..self.names.len())
            .map(|col| match plan[col] {
                None => !(0..self.names.len())
                    .any(|other| other != col && target(other) == Some(self.names[col].as_str())),
                Some(k) => !(0..self.names.len()).any(|other| {
                    other != col
                        && plan[other].is_some_and(|k2| k2 > k && renames[k2].1 == renames[k].1)
                }),
            })
            .collect();

        let names = std::mem::take(&mut self.names);
        let data = std::mem::take(&mut self.data);
        for (col, (name, values)) in names.into_iter().zip(data).enumerate() {
            if keep[col] {
                self.names.push(target(col).map_or(name, str::to_string));
                self.data.push(values);
            }
        }
    }

    fn into_table(self) -> Table {
        let mut rows: Vec<Vec<Value>> = (0..self.row_count)
            .map(|_| Vec::with_capacity(self.names.len()))
            .collect();
        for col in self.data {
            for (row, v) in rows.iter_mut().zip(col) {
                row.push(v);
            }
        }
        Table::new(Schema::new(self.names), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::map_fields;
    use crate::config::FieldMapping;
    use crate::types::{Schema, Table, Value};

    fn one_row(columns: &[&str], values: Vec<Value>) -> Table {
        Table::new(Schema::new(columns.iter().copied()), vec![values])
    }

    #[test]
    fn rename_replaces_source() {
        let t = one_row(&["a"], vec![Value::Int64(1)]);
        let out = map_fields(&t, &FieldMapping::new().rename("a", "b"), false);
        assert_eq!(out, one_row(&["b"], vec![Value::Int64(1)]));
        // Original unchanged
        assert_eq!(t.schema, Schema::new(["a"]));
    }

    #[test]
    fn rename_with_preserve_copies() {
        let t = one_row(&["a"], vec![Value::Int64(1)]);
        let out = map_fields(&t, &FieldMapping::new().rename("a", "b"), true);
        assert_eq!(out, one_row(&["a", "b"], vec![Value::Int64(1), Value::Int64(1)]));
    }

    #[test]
    fn rename_keeps_column_position() {
        let t = one_row(&["x", "a", "y"], vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
        let out = map_fields(&t, &FieldMapping::new().rename("a", "A"), false);
        assert_eq!(out.schema, Schema::new(["x", "A", "y"]));
    }

    #[test]
    fn rename_collisions_are_last_write_wins() {
        let t = one_row(&["a", "b"], vec![Value::Int64(1), Value::Int64(2)]);
        let mapping = FieldMapping::new().rename("a", "c").rename("b", "c");
        let out = map_fields(&t, &mapping, false);
        assert_eq!(out, one_row(&["c"], vec![Value::Int64(2)]));
    }

    #[test]
    fn rename_swap_keeps_both_values() {
        let t = one_row(&["a", "b"], vec![Value::Int64(1), Value::Int64(2)]);
        let mapping = FieldMapping::new().rename("a", "b").rename("b", "a");
        let out = map_fields(&t, &mapping, false);
        assert_eq!(out, one_row(&["b", "a"], vec![Value::Int64(1), Value::Int64(2)]));
    }

    #[test]
    fn rename_chain_reads_the_input_schema() {
        let t = one_row(&["a", "b"], vec![Value::Int64(1), Value::Int64(2)]);
        let mapping = FieldMapping::new().rename("a", "b").rename("b", "c");
        let out = map_fields(&t, &mapping, false);
        assert_eq!(out, one_row(&["b", "c"], vec![Value::Int64(1), Value::Int64(2)]));
    }

    #[test]
    fn rename_onto_a_kept_column_replaces_it() {
        let t = one_row(&["a", "b", "c"], vec![Value::Int64(1), Value::Int64(2), Value::Int64(3)]);
        let out = map_fields(&t, &FieldMapping::new().rename("c", "a"), false);
        assert_eq!(out, one_row(&["b", "a"], vec![Value::Int64(2), Value::Int64(3)]));
    }

    #[test]
    fn rename_with_preserve_copies_input_values() {
        let t = one_row(&["a", "b"], vec![Value::Int64(1), Value::Int64(2)]);
        let mapping = FieldMapping::new().rename("a", "b").rename("b", "a");
        let out = map_fields(&t, &mapping, true);
        assert_eq!(out, one_row(&["a", "b"], vec![Value::Int64(2), Value::Int64(1)]));
    }

    #[test]
    fn rename_of_absent_source_is_skipped() {
        let t = one_row(&["a"], vec![Value::Int64(1)]);
        assert_eq!(map_fields(&t, &FieldMapping::new().rename("zz", "b"), false), t);
        assert_eq!(map_fields(&t, &FieldMapping::new().rename("zz", "b"), true), t);
    }

    #[test]
    fn fan_out_copies_and_removes_source() {
        let t = one_row(&["a"], vec![Value::Int64(5)]);
        let out = map_fields(&t, &FieldMapping::new().fan_out("a", ["b", "c"]), false);
        assert_eq!(out, one_row(&["b", "c"], vec![Value::Int64(5), Value::Int64(5)]));
    }

    #[test]
    fn fan_out_with_preserve_keeps_source() {
        let t = one_row(&["a"], vec![Value::Int64(5)]);
        let out = map_fields(&t, &FieldMapping::new().fan_out("a", ["b", "c"]), true);
        assert_eq!(out.schema, Schema::new(["a", "b", "c"]));
    }

    #[test]
    fn fan_out_overwrites_existing_destination() {
        let t = one_row(&["a", "b"], vec![Value::Int64(5), Value::Int64(0)]);
        let out = map_fields(&t, &FieldMapping::new().fan_out("a", ["b"]), false);
        assert_eq!(out, one_row(&["b"], vec![Value::Int64(5)]));
    }

    #[test]
    fn fan_out_of_absent_source_is_skipped() {
        let t = one_row(&["a"], vec![Value::Int64(5)]);
        let out = map_fields(&t, &FieldMapping::new().fan_out("missing", ["b"]), false);
        assert_eq!(out, t);
    }

    #[test]
    fn fan_out_listing_its_source_keeps_it() {
        let t = one_row(&["a"], vec![Value::Int64(5)]);
        let out = map_fields(&t, &FieldMapping::new().fan_out("a", ["a", "b"]), false);
        assert_eq!(out.schema, Schema::new(["a", "b"]));
    }

    #[test]
    fn renames_run_before_fan_outs() {
        let t = one_row(&["a", "b"], vec![Value::Int64(1), Value::Int64(2)]);
        let mapping = FieldMapping::new().fan_out("b", ["B1", "B2"]).rename("a", "A");
        let out = map_fields(&t, &mapping, false);
        assert_eq!(out.schema, Schema::new(["A", "B1", "B2"]));
        assert_eq!(out.rows[0], vec![Value::Int64(1), Value::Int64(2), Value::Int64(2)]);
    }

    #[test]
    fn mapping_an_empty_table_keeps_the_schema_shape() {
        let t = Table::new(Schema::new(["a"]), Vec::new());
        let out = map_fields(&t, &FieldMapping::new().fan_out("a", ["b", "c"]), false);
        assert_eq!(out.schema, Schema::new(["b", "c"]));
        assert!(out.is_empty());
    }
}
