//! End-to-end session flow over a real DuckDB database, with a canned
//! language model standing in for the generation step.

use async_trait::async_trait;

use askdb_core::{DatabaseConnector, LlmApiClient, QuerySession, SourceError};
use askdb_duck::DuckConnector;

struct CannedSql(&'static str);

#[async_trait]
impl LlmApiClient for CannedSql {
    async fn generate_text(&self, _context: &str, _question: &str) -> Result<String, SourceError> {
        Ok(self.0.to_string())
    }
}

#[tokio::test]
async fn ask_against_duckdb() {
    let mut connector = DuckConnector::in_memory();
    connector.connect().await.unwrap();
    connector
        .execute_query("CREATE TABLE employees (id INTEGER, salary DOUBLE)")
        .await
        .unwrap();
    connector
        .execute_query("INSERT INTO employees VALUES (1, 1000.0), (2, 3000.0)")
        .await
        .unwrap();

    let llm = CannedSql("SELECT AVG(salary) AS avg_salary FROM employees");
    let mut session = QuerySession::new(connector, llm).with_schema("main");

    let result = session.ask("average salary", None).await.unwrap();

    assert_eq!(result.columns, vec!["avg_salary"]);
    assert_eq!(result.row_count, 1);
    assert_eq!(result.rows[0][0], serde_json::json!(2000.0));
    assert!(session.is_connected());

    // The context came from DuckDB's own catalog.
    let context = session.schema_context(None).await.unwrap();
    assert!(context.starts_with("CREATE TABLE employees ("));
    assert!(context.contains("salary"));

    session.disconnect().await.unwrap();
}
