//! Database connector boundary.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::result::QueryResult;

/// Connection lifecycle and statement execution against a relational database.
///
/// An implementation owns a single connection; there is no pooling and a
/// single failed attempt is final. The `&mut self` receivers mean a connector
/// can only ever be driven by one caller at a time.
#[async_trait]
pub trait DatabaseConnector {
    /// Establish the connection.
    async fn connect(&mut self) -> Result<(), SourceError>;

    /// Close the connection.
    async fn disconnect(&mut self) -> Result<(), SourceError>;

    /// Run one SQL statement and return its rows.
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult, SourceError>;
}
