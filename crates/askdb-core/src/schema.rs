//! Schema-context assembly from catalog metadata.
//!
//! Queries `information_schema.columns` and renders one `CREATE TABLE`
//! statement per table. The rendered statements prime the language model
//! with the shape of the database before it writes any SQL.

use serde_json::Value;
use thiserror::Error;

use crate::result::QueryResult;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("catalog result is missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("catalog row {row} has a non-string '{column}' value")]
    NonStringValue { row: usize, column: &'static str },
}

/// Which tables to introspect. Also the schema-context cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TableFilter {
    /// Every table in the configured schema.
    AllTables,
    /// An explicit set of tables, sorted and deduplicated.
    Tables(Vec<String>),
}

impl TableFilter {
    /// Build a filter from an optional name list. `None` and an empty list
    /// both mean all tables.
    pub fn from_names(names: Option<&[&str]>) -> Self {
        match names {
            None => TableFilter::AllTables,
            Some([]) => TableFilter::AllTables,
            Some(names) => {
                let mut names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
                names.sort();
                names.dedup();
                TableFilter::Tables(names)
            }
        }
    }
}

/// One row of `information_schema.columns` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

/// SQL fetching `(table_name, column_name, data_type)` for the filtered tables.
///
/// Ordering is pinned so rendered statements are identical across backends
/// and runs: tables alphabetically, columns in declaration order.
pub fn column_info_query(filter: &TableFilter, schema: &str) -> String {
    let where_clause = match filter {
        TableFilter::AllTables => format!("WHERE table_schema = '{}'", escape_literal(schema)),
        TableFilter::Tables(names) => {
            let list = names
                .iter()
                .map(|name| format!("'{}'", escape_literal(name)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("WHERE table_name IN ({list})")
        }
    };

    format!(
        "SELECT table_name, column_name, data_type \
         FROM information_schema.columns \
         {where_clause} \
         ORDER BY table_name, ordinal_position"
    )
}

fn escape_literal(s: &str) -> String {
    s.replace('\'', "''")
}

/// Decode a catalog query result into column rows.
///
/// A fully empty result decodes to no rows: some connectors cannot report
/// column names for a zero-row result, and an empty schema is not an error.
pub fn decode_column_rows(result: &QueryResult) -> Result<Vec<ColumnRow>, SchemaError> {
    if result.columns.is_empty() && result.rows.is_empty() {
        return Ok(Vec::new());
    }

    let table_idx = result
        .column_index("table_name")
        .ok_or(SchemaError::MissingColumn("table_name"))?;
    let column_idx = result
        .column_index("column_name")
        .ok_or(SchemaError::MissingColumn("column_name"))?;
    let type_idx = result
        .column_index("data_type")
        .ok_or(SchemaError::MissingColumn("data_type"))?;

    let mut rows = Vec::with_capacity(result.rows.len());
    for (row_no, row) in result.rows.iter().enumerate() {
        rows.push(ColumnRow {
            table_name: string_cell(row, table_idx, "table_name", row_no)?,
            column_name: string_cell(row, column_idx, "column_name", row_no)?,
            data_type: string_cell(row, type_idx, "data_type", row_no)?,
        });
    }
    Ok(rows)
}

fn string_cell(
    row: &[Value],
    idx: usize,
    column: &'static str,
    row_no: usize,
) -> Result<String, SchemaError> {
    match row.get(idx) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(SchemaError::NonStringValue {
            row: row_no,
            column,
        }),
    }
}

/// Render one `CREATE TABLE <table> (<col> <type>, ...);` statement per table.
///
/// Rows must arrive grouped by table; the catalog query's `ORDER BY`
/// guarantees that.
pub fn render_create_tables(rows: &[ColumnRow]) -> Vec<String> {
    let mut statements: Vec<String> = Vec::new();
    let mut table: Option<&str> = None;
    let mut cols: Vec<String> = Vec::new();

    for row in rows {
        if table != Some(row.table_name.as_str()) {
            if let Some(name) = table {
                statements.push(format!("CREATE TABLE {} ({});", name, cols.join(", ")));
            }
            table = Some(row.table_name.as_str());
            cols.clear();
        }
        cols.push(format!("{} {}", row.column_name, row.data_type));
    }
    if let Some(name) = table {
        statements.push(format!("CREATE TABLE {} ({});", name, cols.join(", ")));
    }

    statements
}
