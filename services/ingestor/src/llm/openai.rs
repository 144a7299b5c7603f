use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{CompletionClient, CompletionRequest, SummarizationError};

pub struct OpenAiCompletions {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiCompletions {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletions {
    async fn complete(&self, request: CompletionRequest) -> Result<Value, SummarizationError> {
        let payload = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": request.schema_name,
                    "strict": true,
                    "schema": request.schema,
                },
            },
        });

        debug!(model = %request.model, schema = request.schema_name, "Requesting completion");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(SummarizationError::Api { status, body });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| SummarizationError::Malformed(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SummarizationError::Malformed("response had no choices".to_string()))?;
        if let Some(refusal) = choice.message.refusal {
            return Err(SummarizationError::Malformed(format!(
                "model refused: {}",
                refusal
            )));
        }
        let content = choice.message.content.ok_or_else(|| {
            SummarizationError::Malformed("choice carried no content".to_string())
        })?;

        serde_json::from_str(&content)
            .map_err(|e| SummarizationError::Malformed(format!("undecodable content: {}", e)))
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}
