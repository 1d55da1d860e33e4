//! Error taxonomy for the query session.

use thiserror::Error;

/// Boxed error reported by a collaborator (database connector or language-model client).
pub type SourceError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What went wrong inside an operation, tagged by stage.
///
/// Connection failures deliberately keep their display text generic; the
/// collaborator's own message stays reachable through the error source chain
/// rather than being echoed to the caller.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to connect to the database")]
    Connection(#[source] SourceError),

    #[error("failed to disconnect from the database")]
    Disconnection(#[source] SourceError),

    #[error("error generating CREATE TABLE statements: {0}")]
    SchemaIntrospection(#[source] SourceError),

    #[error("language model failed to generate a SQL query: {0}")]
    Generation(#[source] SourceError),

    #[error("language model returned an empty SQL query")]
    EmptyGeneration,

    #[error("failed to execute generated SQL: {0}")]
    Execution(#[source] SourceError),
}

/// The single failure type surfaced by [`ask`](crate::QuerySession::ask).
///
/// Every stage failure is wrapped into one message shape; the originating
/// [`QueryError`] stays available through [`kind`](AskError::kind) for
/// callers that need to tell a connection problem from a bad generation.
#[derive(Debug, Error)]
#[error("Error in 'ask' method: {0}")]
pub struct AskError(#[from] QueryError);

impl AskError {
    /// The originating failure kind.
    pub fn kind(&self) -> &QueryError {
        &self.0
    }

    /// Unwrap into the originating failure kind.
    pub fn into_kind(self) -> QueryError {
        self.0
    }
}
