use serde::Serialize;
use serde_json::Value;

use crate::core::FlatRecord;

/// Projected rows with one shared column list. Missing cells are `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Cells of one column, or nothing when the column is absent.
    pub fn column<'a>(&'a self, label: &str) -> impl Iterator<Item = &'a Value> + use<'a> {
        let idx = self.column_index(label);
        self.rows
            .iter()
            .filter_map(move |row| idx.and_then(|i| row.get(i)))
    }

    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[Value]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    pub fn map_column(&mut self, label: &str, mut f: impl FnMut(&Value) -> Value) {
        let Some(idx) = self.column_index(label) else {
            return;
        };
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(idx) {
                *cell = f(cell);
            }
        }
    }

    /// Rows keyed by column label, for feeding a table back through a projection.
    pub fn records(&self) -> Vec<FlatRecord> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}
