//! Natural-language questions against a relational database.
//!
//! A [`QuerySession`] owns a database connector and a language-model client.
//! Asking a question introspects the database catalog, renders the schema as
//! `CREATE TABLE` statements, hands those to the language model as grounding,
//! and executes the SQL it writes:
//!
//! ```ignore
//! let mut session = QuerySession::new(connector, llm);
//! let result = session.ask("average salary by department", None).await?;
//! ```
//!
//! The concrete connectors and LLM clients live in sibling crates
//! (`askdb-duck`, `askdb-postgres`, `askdb-openai`); this crate only knows
//! the two collaborator traits.

pub mod connector;
pub mod error;
pub mod llm;
pub mod result;
pub mod schema;
pub mod session;

pub use connector::DatabaseConnector;
pub use error::{AskError, QueryError, SourceError};
pub use llm::LlmApiClient;
pub use result::QueryResult;
pub use session::{QuerySession, DEFAULT_SCHEMA};
