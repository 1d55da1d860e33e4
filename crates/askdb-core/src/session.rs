//! Connection lifecycle and question-to-result orchestration.

use std::collections::HashMap;

use tracing::{debug, error, info};

use crate::connector::DatabaseConnector;
use crate::error::{AskError, QueryError};
use crate::llm::LlmApiClient;
use crate::result::QueryResult;
use crate::schema::{self, TableFilter};

/// Schema searched when no explicit table list is given.
pub const DEFAULT_SCHEMA: &str = "public";

/// Orchestrates one database connection and one language-model client.
///
/// A session is strictly single-caller: every operation takes `&mut self`,
/// so overlapping calls on the same session do not compile. Schema contexts
/// are built lazily and cached per table filter; [`refresh_schema`] drops
/// the cache when the database shape has changed underneath the session.
///
/// [`refresh_schema`]: QuerySession::refresh_schema
pub struct QuerySession<D, L> {
    connector: D,
    llm: L,
    connected: bool,
    schema: String,
    contexts: HashMap<TableFilter, Vec<String>>,
}

impl<D: DatabaseConnector, L: LlmApiClient> QuerySession<D, L> {
    pub fn new(connector: D, llm: L) -> Self {
        Self {
            connector,
            llm,
            connected: false,
            schema: DEFAULT_SCHEMA.to_string(),
            contexts: HashMap::new(),
        }
    }

    /// Introspect a schema other than `public` when asking about all tables.
    /// DuckDB calls its default schema `main`.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Establish the database connection. No-op when already connected.
    pub async fn connect(&mut self) -> Result<(), QueryError> {
        if self.connected {
            return Ok(());
        }
        match self.connector.connect().await {
            Ok(()) => {
                self.connected = true;
                info!("database connection established");
                Ok(())
            }
            Err(e) => {
                error!("failed to connect to the database: {e}");
                Err(QueryError::Connection(e))
            }
        }
    }

    /// Close the database connection. No-op when already disconnected.
    pub async fn disconnect(&mut self) -> Result<(), QueryError> {
        if !self.connected {
            return Ok(());
        }
        match self.connector.disconnect().await {
            Ok(()) => {
                self.connected = false;
                info!("database connection closed");
                Ok(())
            }
            Err(e) => {
                error!("failed to disconnect from the database: {e}");
                Err(QueryError::Disconnection(e))
            }
        }
    }

    /// Drop all cached schema contexts; the next question re-introspects.
    pub fn refresh_schema(&mut self) {
        self.contexts.clear();
    }

    /// The space-joined `CREATE TABLE` context for the given tables (all
    /// tables when `None` or empty), built on first use and cached per
    /// filter.
    pub async fn schema_context(
        &mut self,
        table_names: Option<&[&str]>,
    ) -> Result<String, QueryError> {
        let filter = TableFilter::from_names(table_names);
        let statements = self.create_table_statements(&filter).await?;
        Ok(statements.join(" "))
    }

    /// Answer a natural-language question with a tabular result.
    ///
    /// Connects if needed, grounds the language model on the schema context
    /// for `table_names` (all tables when `None`), executes the generated
    /// SQL, and returns its rows. Any failure along the way surfaces as a
    /// single [`AskError`]; the originating kind stays available through
    /// [`AskError::kind`].
    pub async fn ask(
        &mut self,
        question: &str,
        table_names: Option<&[&str]>,
    ) -> Result<QueryResult, AskError> {
        self.ask_inner(question, table_names)
            .await
            .map_err(AskError::from)
    }

    async fn ask_inner(
        &mut self,
        question: &str,
        table_names: Option<&[&str]>,
    ) -> Result<QueryResult, QueryError> {
        self.connect().await?;

        let context = self.schema_context(table_names).await?;

        info!("generating query using llm");
        let generated = self
            .llm
            .generate_text(&context, question)
            .await
            .map_err(|e| {
                error!("language model failed to generate a SQL query: {e}");
                QueryError::Generation(e)
            })?;

        let sql = generated.trim();
        if sql.is_empty() {
            error!("language model returned an empty SQL query");
            return Err(QueryError::EmptyGeneration);
        }

        debug!(%sql, "executing generated query");
        self.connector.execute_query(sql).await.map_err(|e| {
            error!("failed to execute generated SQL: {e}");
            QueryError::Execution(e)
        })
    }

    async fn create_table_statements(
        &mut self,
        filter: &TableFilter,
    ) -> Result<Vec<String>, QueryError> {
        if let Some(cached) = self.contexts.get(filter) {
            debug!(?filter, "schema context cache hit");
            return Ok(cached.clone());
        }

        let query = schema::column_info_query(filter, &self.schema);
        debug!(%query, "introspecting catalog metadata");

        let result = self.connector.execute_query(&query).await.map_err(|e| {
            error!("error generating CREATE TABLE statements: {e}");
            QueryError::SchemaIntrospection(e)
        })?;

        let rows = schema::decode_column_rows(&result).map_err(|e| {
            error!("error generating CREATE TABLE statements: {e}");
            QueryError::SchemaIntrospection(e.into())
        })?;

        let statements = schema::render_create_tables(&rows);
        self.contexts.insert(filter.clone(), statements.clone());
        Ok(statements)
    }
}
