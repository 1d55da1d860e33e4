//! DuckDB-backed database connector.

use std::path::PathBuf;

use async_trait::async_trait;
use duckdb::Connection;
use thiserror::Error;
use tracing::debug;

use askdb_core::{DatabaseConnector, QueryResult, SourceError};

#[derive(Debug, Error)]
pub enum DuckConnectorError {
    #[error("Database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("not connected")]
    NotConnected,
}

#[derive(Debug, Clone)]
enum Location {
    Memory,
    Path(PathBuf),
}

/// [`DatabaseConnector`] over a DuckDB database, in-memory or file-backed.
///
/// The connection opens on `connect` and closes on `disconnect`; executing
/// while disconnected is a [`DuckConnectorError::NotConnected`] error.
pub struct DuckConnector {
    location: Location,
    conn: Option<Connection>,
}

impl DuckConnector {
    /// Connector for an in-memory database.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: None,
        }
    }

    /// Connector for a database file.
    pub fn open_path(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::Path(path.into()),
            conn: None,
        }
    }

    fn open(&self) -> Result<Connection, DuckConnectorError> {
        let conn = match &self.location {
            Location::Memory => Connection::open_in_memory()?,
            Location::Path(path) => Connection::open(path)?,
        };
        Ok(conn)
    }

    fn run_query(conn: &Connection, sql: &str) -> Result<QueryResult, DuckConnectorError> {
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut columns: Vec<String> = Vec::new();
        let mut result_rows: Vec<Vec<serde_json::Value>> = Vec::new();

        while let Some(row) = rows.next()? {
            if columns.is_empty() {
                let stmt = row.as_ref();
                for i in 0..stmt.column_count() {
                    columns.push(stmt.column_name(i)?.to_string());
                }
            }

            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(value_to_json(row.get_ref(i)?));
            }
            result_rows.push(cells);
        }

        Ok(QueryResult::new(columns, result_rows))
    }
}

#[async_trait]
impl DatabaseConnector for DuckConnector {
    async fn connect(&mut self) -> Result<(), SourceError> {
        if self.conn.is_none() {
            self.conn = Some(self.open()?);
            debug!("opened duckdb database");
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| DuckConnectorError::Database(e))?;
            debug!("closed duckdb database");
        }
        Ok(())
    }

    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult, SourceError> {
        let conn = self.conn.as_ref().ok_or(DuckConnectorError::NotConnected)?;
        Ok(Self::run_query(conn, sql)?)
    }
}

/// Convert a DuckDB cell to JSON.
fn value_to_json(value: duckdb::types::ValueRef<'_>) -> serde_json::Value {
    use duckdb::types::ValueRef;

    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Boolean(b) => serde_json::Value::Bool(b),
        ValueRef::TinyInt(i) => serde_json::json!(i),
        ValueRef::SmallInt(i) => serde_json::json!(i),
        ValueRef::Int(i) => serde_json::json!(i),
        ValueRef::BigInt(i) => serde_json::json!(i),
        ValueRef::HugeInt(i) => serde_json::json!(i),
        ValueRef::UTinyInt(i) => serde_json::json!(i),
        ValueRef::USmallInt(i) => serde_json::json!(i),
        ValueRef::UInt(i) => serde_json::json!(i),
        ValueRef::UBigInt(i) => serde_json::json!(i),
        ValueRef::Float(f) => serde_json::json!(f),
        ValueRef::Double(f) => serde_json::json!(f),
        ValueRef::Text(s) => serde_json::Value::String(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
        _ => serde_json::Value::String("<unsupported>".to_string()),
    }
}
