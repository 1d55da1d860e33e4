//! OpenAI integration for natural language to SQL conversion.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

use askdb_core::{LlmApiClient, SourceError};

/// Chat model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// System prompt - teaches the model to emit exactly one SQL statement.
const SYSTEM_PROMPT: &str = r#"You are an expert at translating natural language questions into SQL.

You will be given the database schema as a series of CREATE TABLE statements, followed by a question. Respond with exactly one executable SQL statement that answers the question.

Important Rules:
1. Return ONLY the SQL statement - no markdown, no explanations, no commentary.
2. Use only tables and columns that appear in the schema.
3. Prefer standard SQL; avoid vendor-specific extensions unless the schema requires them.
4. Never modify data: generate SELECT statements only."#;

/// [`LlmApiClient`] backed by the OpenAI chat completions API.
///
/// Generation is deterministic (temperature 0); the schema context is
/// appended to the system message and the question goes in verbatim as the
/// user message.
pub struct OpenAiSqlClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSqlClient {
    /// Client with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key.into());
        Self {
            client: Client::with_config(config),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Client configured from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        Ok(Self::new(std::env::var("OPENAI_API_KEY")?))
    }

    /// Override the chat model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[async_trait]
impl LlmApiClient for OpenAiSqlClient {
    async fn generate_text(&self, context: &str, question: &str) -> Result<String, SourceError> {
        let system_prompt = format!("{SYSTEM_PROMPT}\n\nDatabase schema:\n{context}");

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(question)
                    .build()?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.0)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or_default();

        debug!(model = %self.model, "llm response: {content}");

        Ok(strip_code_fence(content).to_string())
    }
}

/// Chat models tend to wrap SQL in a markdown fence even when told not to.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(rest) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop a language tag on the opening fence ("```sql").
    let rest = match rest.split_once('\n') {
        Some((first, body)) if !first.trim().is_empty() && !first.trim().contains(' ') => body,
        _ => rest,
    };
    rest.trim()
}
