//! Tabular results of executed queries.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Column-ordered rows returned by a database connector.
///
/// Cells are JSON values so the type lives independently of any one database
/// backend's value representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    pub row_count: usize,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Index of a named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Render as `{"columns": [...], "rows": [{...}], "row_count": n}` with
    /// one object per row.
    pub fn to_json(&self) -> serde_json::Value {
        let mut rows = Vec::new();

        for row in &self.rows {
            let mut row_obj = serde_json::Map::new();
            for (i, col_name) in self.columns.iter().enumerate() {
                if let Some(value) = row.get(i) {
                    row_obj.insert(col_name.clone(), value.clone());
                }
            }
            rows.push(serde_json::Value::Object(row_obj));
        }

        json!({
            "columns": self.columns,
            "rows": rows,
            "row_count": self.row_count,
        })
    }
}
