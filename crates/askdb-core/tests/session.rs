//! Session-level flows against scripted collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use askdb_core::{
    DatabaseConnector, LlmApiClient, QueryError, QueryResult, QuerySession, SourceError,
};

#[derive(Debug, Default)]
struct CallLog {
    connects: usize,
    disconnects: usize,
    queries: Vec<String>,
}

impl CallLog {
    fn catalog_queries(&self) -> usize {
        self.queries
            .iter()
            .filter(|q| q.starts_with("SELECT table_name"))
            .count()
    }

    fn executed_queries(&self) -> usize {
        self.queries.len() - self.catalog_queries()
    }
}

/// Connector that serves a canned catalog for introspection queries and a
/// canned result for everything else.
struct MockConnector {
    log: Arc<Mutex<CallLog>>,
    catalog: QueryResult,
    result: QueryResult,
    fail_connect: bool,
    fail_execute: bool,
}

impl MockConnector {
    fn new(log: Arc<Mutex<CallLog>>, catalog: QueryResult, result: QueryResult) -> Self {
        Self {
            log,
            catalog,
            result,
            fail_connect: false,
            fail_execute: false,
        }
    }
}

#[async_trait]
impl DatabaseConnector for MockConnector {
    async fn connect(&mut self) -> Result<(), SourceError> {
        if self.fail_connect {
            return Err("connection refused".into());
        }
        self.log.lock().unwrap().connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), SourceError> {
        self.log.lock().unwrap().disconnects += 1;
        Ok(())
    }

    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult, SourceError> {
        self.log.lock().unwrap().queries.push(sql.to_string());
        if sql.starts_with("SELECT table_name") {
            Ok(self.catalog.clone())
        } else if self.fail_execute {
            Err("syntax error at or near \"FROM\"".into())
        } else {
            Ok(self.result.clone())
        }
    }
}

struct MockLlm {
    reply: String,
    seen: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
}

impl MockLlm {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }
}

#[async_trait]
impl LlmApiClient for MockLlm {
    async fn generate_text(&self, context: &str, question: &str) -> Result<String, SourceError> {
        if self.fail {
            return Err("llm backend unavailable".into());
        }
        self.seen
            .lock()
            .unwrap()
            .push((context.to_string(), question.to_string()));
        Ok(self.reply.clone())
    }
}

fn catalog(rows: &[(&str, &str, &str)]) -> QueryResult {
    QueryResult::new(
        vec![
            "table_name".to_string(),
            "column_name".to_string(),
            "data_type".to_string(),
        ],
        rows.iter()
            .map(|(t, c, d)| vec![json!(t), json!(c), json!(d)])
            .collect(),
    )
}

fn employees_catalog() -> QueryResult {
    catalog(&[
        ("employees", "id", "int"),
        ("employees", "salary", "numeric"),
    ])
}

fn avg_salary_result() -> QueryResult {
    QueryResult::new(vec!["avg".to_string()], vec![vec![json!(61000.5)]])
}

#[tokio::test]
async fn connect_and_disconnect_are_idempotent() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let connector = MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    let mut session = QuerySession::new(connector, MockLlm::replying("SELECT 1"));

    assert!(!session.is_connected());
    session.disconnect().await.unwrap();
    assert_eq!(log.lock().unwrap().disconnects, 0);

    session.connect().await.unwrap();
    session.connect().await.unwrap();
    assert!(session.is_connected());
    assert_eq!(log.lock().unwrap().connects, 1);

    session.disconnect().await.unwrap();
    session.disconnect().await.unwrap();
    assert!(!session.is_connected());
    assert_eq!(log.lock().unwrap().disconnects, 1);
}

#[tokio::test]
async fn failed_connect_leaves_state_disconnected() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let mut connector =
        MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    connector.fail_connect = true;
    let mut session = QuerySession::new(connector, MockLlm::replying("SELECT 1"));

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, QueryError::Connection(_)));
    assert!(!session.is_connected());
    assert_eq!(log.lock().unwrap().connects, 0);
}

#[tokio::test]
async fn ask_returns_result_and_stays_connected() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let connector = MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    let llm = MockLlm::replying("SELECT AVG(salary) FROM employees;");
    let seen = llm.seen.clone();
    let mut session = QuerySession::new(connector, llm);

    let result = session.ask("average salary", None).await.unwrap();

    assert_eq!(result, avg_salary_result());
    assert!(session.is_connected());

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![(
            "CREATE TABLE employees (id int, salary numeric);".to_string(),
            "average salary".to_string(),
        )]
    );

    let log = log.lock().unwrap();
    assert_eq!(log.connects, 1);
    assert_eq!(log.catalog_queries(), 1);
    assert_eq!(log.executed_queries(), 1);
    assert_eq!(
        log.queries.last().unwrap(),
        "SELECT AVG(salary) FROM employees;"
    );
}

#[tokio::test]
async fn generated_sql_is_trimmed_before_execution() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let connector = MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    let llm = MockLlm::replying("  SELECT AVG(salary) FROM employees;\n");
    let mut session = QuerySession::new(connector, llm);

    session.ask("average salary", None).await.unwrap();

    let log = log.lock().unwrap();
    assert_eq!(
        log.queries.last().unwrap(),
        "SELECT AVG(salary) FROM employees;"
    );
}

#[tokio::test]
async fn empty_generation_fails_without_executing() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let connector = MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    let mut session = QuerySession::new(connector, MockLlm::replying("  \n"));

    let err = session.ask("average salary", None).await.unwrap_err();

    assert!(matches!(err.kind(), QueryError::EmptyGeneration));
    assert_eq!(
        err.to_string(),
        "Error in 'ask' method: language model returned an empty SQL query"
    );
    // Only the catalog introspection ran; the execute step never did.
    let log = log.lock().unwrap();
    assert_eq!(log.catalog_queries(), 1);
    assert_eq!(log.executed_queries(), 0);
}

#[tokio::test]
async fn execution_failure_wraps_and_stays_connected() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let mut connector =
        MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    connector.fail_execute = true;
    let llm = MockLlm::replying("SELECT oops FROM employees;");
    let mut session = QuerySession::new(connector, llm);

    let err = session.ask("average salary", None).await.unwrap_err();

    assert!(err.to_string().starts_with("Error in 'ask' method:"));
    assert!(matches!(err.kind(), QueryError::Execution(_)));
    assert!(session.is_connected());
}

#[tokio::test]
async fn llm_transport_failure_is_a_generation_error() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let connector = MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    let mut llm = MockLlm::replying("SELECT 1");
    llm.fail = true;
    let mut session = QuerySession::new(connector, llm);

    let err = session.ask("average salary", None).await.unwrap_err();
    assert!(matches!(err.kind(), QueryError::Generation(_)));
}

#[tokio::test]
async fn schema_context_is_cached_per_filter() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let connector = MockConnector::new(log.clone(), employees_catalog(), avg_salary_result());
    let llm = MockLlm::replying("SELECT AVG(salary) FROM employees;");
    let mut session = QuerySession::new(connector, llm);

    session.ask("average salary", None).await.unwrap();
    session.ask("average salary", None).await.unwrap();
    assert_eq!(log.lock().unwrap().catalog_queries(), 1);

    // A different filter is a distinct cache entry, introspected on its own.
    session
        .ask("average salary", Some(&["employees"]))
        .await
        .unwrap();
    {
        let log = log.lock().unwrap();
        assert_eq!(log.catalog_queries(), 2);
        assert!(log
            .queries
            .iter()
            .any(|q| q.contains("WHERE table_name IN ('employees')")));
    }

    // Refresh drops every entry; the next ask re-introspects.
    session.refresh_schema();
    session.ask("average salary", None).await.unwrap();
    assert_eq!(log.lock().unwrap().catalog_queries(), 3);
}

#[tokio::test]
async fn schema_context_accessor_joins_statements() {
    let log = Arc::new(Mutex::new(CallLog::default()));
    let connector = MockConnector::new(
        log.clone(),
        catalog(&[
            ("orders", "id", "integer"),
            ("users", "id", "integer"),
            ("users", "name", "text"),
        ]),
        avg_salary_result(),
    );
    let mut session = QuerySession::new(connector, MockLlm::replying("SELECT 1"));
    session.connect().await.unwrap();

    let context = session.schema_context(None).await.unwrap();
    assert_eq!(
        context,
        "CREATE TABLE orders (id integer); CREATE TABLE users (id integer, name text);"
    );
}
