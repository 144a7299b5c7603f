use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod openai;

pub use openai::OpenAiCompletions;

#[derive(Error, Debug)]
pub enum SummarizationError {
    #[error("completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("completion API error ({status}): {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("model returned an unusable response: {0}")]
    Malformed(String),
}

/// One structured completion call. `schema` is the JSON Schema the model
/// output must satisfy; the reply is returned as the parsed JSON document.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub schema_name: &'static str,
    pub schema: Value,
}

/// A provider that answers structured completion requests. Every call is a
/// side-effecting, non-idempotent operation; callers own any retry policy.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Value, SummarizationError>;
}
