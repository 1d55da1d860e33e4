//! askdb - ask a natural-language question against a relational database.
//!
//! Translates the question to SQL with a language model, executes it, and
//! prints the result table as JSON.
//!
//! Usage: `askdb "<question>" [table ...]`
//!
//! Settings come from `askdb.yaml` and environment overrides; the OpenAI
//! API key comes from `OPENAI_API_KEY` (a `.env` file is honored). The
//! generated SQL runs unreviewed, so point askdb at a read-only database
//! role.

mod config;
mod logging;

use anyhow::{bail, Context};
use tracing::info;

use askdb_core::{DatabaseConnector, QueryResult, QuerySession};
use askdb_duck::DuckConnector;
use askdb_openai::OpenAiSqlClient;
use askdb_postgres::{PostgresConfig, PostgresConnector};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::load("askdb.yaml").context("loading configuration")?;
    logging::init(&config.logging);

    let mut args = std::env::args().skip(1);
    let Some(question) = args.next() else {
        bail!("usage: askdb \"<question>\" [table ...]");
    };
    let tables: Vec<String> = args.collect();
    let table_refs: Vec<&str> = tables.iter().map(String::as_str).collect();
    let table_names = (!table_refs.is_empty()).then_some(table_refs.as_slice());

    let api_key = Config::openai_api_key()?;
    let llm = OpenAiSqlClient::new(api_key).with_model(&config.llm.model);

    info!(backend = %config.database.backend, "starting askdb");

    let schema = config.database.effective_schema();
    let result = match config.database.backend.as_str() {
        "duckdb" => {
            let connector = match &config.database.path {
                Some(path) => DuckConnector::open_path(path),
                None => DuckConnector::in_memory(),
            };
            run(connector, llm, schema, &question, table_names).await?
        }
        "postgres" => {
            let connector = PostgresConnector::new(PostgresConfig {
                host: config.database.host.clone(),
                port: config.database.port,
                user: config.database.user.clone(),
                password: config.database.password.clone(),
                dbname: config.database.dbname.clone(),
            });
            run(connector, llm, schema, &question, table_names).await?
        }
        other => bail!("unknown database backend '{other}' (expected \"duckdb\" or \"postgres\")"),
    };

    println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    Ok(())
}

async fn run<D: DatabaseConnector>(
    connector: D,
    llm: OpenAiSqlClient,
    schema: &str,
    question: &str,
    table_names: Option<&[&str]>,
) -> anyhow::Result<QueryResult> {
    let mut session = QuerySession::new(connector, llm).with_schema(schema);
    let result = session.ask(question, table_names).await?;
    session.disconnect().await?;
    Ok(result)
}
