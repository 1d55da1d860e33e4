//! PostgreSQL-backed database connector.

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, warn};

use askdb_core::{DatabaseConnector, QueryResult, SourceError};

#[derive(Debug, Error)]
pub enum PostgresConnectorError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("not connected")]
    NotConnected,
}

/// Connection settings for a remote PostgreSQL server.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
}

impl PostgresConfig {
    fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

/// [`DatabaseConnector`] over a remote PostgreSQL server.
///
/// `connect` establishes the client and spawns the socket driver task;
/// `disconnect` drops the client, which lets the driver wind down.
pub struct PostgresConnector {
    config: PostgresConfig,
    client: Option<Client>,
    driver: Option<JoinHandle<()>>,
}

impl PostgresConnector {
    pub fn new(config: PostgresConfig) -> Self {
        Self {
            config,
            client: None,
            driver: None,
        }
    }
}

#[async_trait]
impl DatabaseConnector for PostgresConnector {
    async fn connect(&mut self) -> Result<(), SourceError> {
        if self.client.is_some() {
            return Ok(());
        }

        let (client, connection) =
            tokio_postgres::connect(&self.config.connection_string(), NoTls)
                .await
                .map_err(PostgresConnectorError::Database)?;

        // The connection future drives the socket until the client drops.
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!("postgres connection terminated: {e}");
            }
        });

        self.client = Some(client);
        self.driver = Some(driver);
        debug!(
            host = %self.config.host,
            dbname = %self.config.dbname,
            "postgres connection established"
        );
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        self.client = None;
        if let Some(driver) = self.driver.take() {
            let _ = driver.await;
            debug!("postgres connection closed");
        }
        Ok(())
    }

    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult, SourceError> {
        let client = self
            .client
            .as_ref()
            .ok_or(PostgresConnectorError::NotConnected)?;

        let rows = client
            .query(sql, &[])
            .await
            .map_err(PostgresConnectorError::Database)?;

        Ok(rows_to_result(&rows))
    }
}

fn rows_to_result(rows: &[Row]) -> QueryResult {
    let columns: Vec<String> = rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let data = rows
        .iter()
        .map(|row| (0..row.len()).map(|i| cell_to_json(row, i)).collect())
        .collect();

    QueryResult::new(columns, data)
}

/// Convert a PostgreSQL cell to JSON by its declared column type.
fn cell_to_json(row: &Row, idx: usize) -> serde_json::Value {
    use serde_json::{json, Value};

    let value = match row.columns()[idx].type_().name() {
        "bool" => row.try_get::<_, Option<bool>>(idx).map(|v| json!(v)),
        "int2" => row.try_get::<_, Option<i16>>(idx).map(|v| json!(v)),
        "int4" => row.try_get::<_, Option<i32>>(idx).map(|v| json!(v)),
        "int8" => row.try_get::<_, Option<i64>>(idx).map(|v| json!(v)),
        "float4" => row.try_get::<_, Option<f32>>(idx).map(|v| json!(v)),
        "float8" => row.try_get::<_, Option<f64>>(idx).map(|v| json!(v)),
        "text" | "varchar" | "bpchar" | "name" => {
            row.try_get::<_, Option<String>>(idx).map(|v| json!(v))
        }
        other => row
            .try_get::<_, Option<String>>(idx)
            .map(|v| json!(v))
            .or_else(|_| {
                Ok::<_, tokio_postgres::Error>(Value::String(format!("<unsupported {other}>")))
            }),
    };

    value.unwrap_or(Value::Null)
}
