// ============================================================
// TABLE FLATTENER
// ============================================================
// Explode the nested record column into top-level columns

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::domain::export::{CellValue, PostProcessConfig, Scalar, Table};

pub struct TableFlattener {
    nested_column: String,

    /// Joins parent and child keys of nested records
    separator: String,
}

impl TableFlattener {
    pub fn new(config: &PostProcessConfig) -> Self {
        Self {
            nested_column: config.nested_column.clone(),
            separator: config.key_separator.clone(),
        }
    }

    /// Replace the nested column with one column per record key.
    ///
    /// New columns follow the surviving ones in first-seen key order. Rows
    /// without a key get an empty cell, and a key that names an existing
    /// column is dropped in favor of that column.
    pub fn flatten(&self, mut table: Table) -> Table {
        let Some(index) = table.column_index(&self.nested_column) else {
            return table;
        };

        let (_, cells) = table.remove_column(index);

        let mut keys = Vec::new();
        let mut seen = HashSet::new();
        let mut records: Vec<HashMap<String, Scalar>> = Vec::with_capacity(cells.len());

        for (row, cell) in cells.into_iter().enumerate() {
            let mut fields = Vec::new();
            match cell {
                CellValue::Structured(map) => self.flatten_record(&map, None, &mut fields),
                empty if empty.is_empty() => {}
                other => warn!(
                    row,
                    value = %other,
                    column = %self.nested_column,
                    "Nested cell is not a record, leaving its row empty"
                ),
            }

            for (key, _) in &fields {
                if seen.insert(key.clone()) {
                    keys.push(key.clone());
                }
            }
            records.push(fields.into_iter().collect());
        }

        for key in keys {
            if table.has_column(&key) {
                warn!(column = %key, "Flattened column duplicates an existing column, keeping the original");
                continue;
            }

            let column = records
                .iter_mut()
                .map(|record| {
                    record
                        .remove(&key)
                        .map(CellValue::Plain)
                        .unwrap_or_else(CellValue::empty)
                })
                .collect();
            table.push_column(key, column);
        }

        debug!(columns = table.column_count(), "Flattened nested column");
        table
    }

    fn flatten_record(
        &self,
        record: &Map<String, Value>,
        prefix: Option<&str>,
        out: &mut Vec<(String, Scalar)>,
    ) {
        for (key, value) in record {
            let path = match prefix {
                Some(prefix) => format!("{}{}{}", prefix, self.separator, key),
                None => key.clone(),
            };

            match value {
                Value::Object(inner) => self.flatten_record(inner, Some(&path), out),
                leaf => out.push((path, Scalar::from_json(leaf))),
            }
        }
    }
}
