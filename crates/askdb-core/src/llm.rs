//! Language-model client boundary.

use async_trait::async_trait;

use crate::error::SourceError;

/// Text generation grounded on a schema context.
#[async_trait]
pub trait LlmApiClient {
    /// Translate a natural-language question into SQL text.
    ///
    /// `context` is a space-joined series of `CREATE TABLE` statements
    /// describing the tables the query may touch. An empty return value is
    /// valid at this boundary; the caller decides whether to treat it as a
    /// failure.
    async fn generate_text(&self, context: &str, question: &str) -> Result<String, SourceError>;
}
