use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const SLACK_API_BASE: &str = "https://slack.com/api";

pub struct SlackClient {
    client: Client,
}

impl SlackClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Post a plain text message to a channel.
    pub async fn post_message(&self, token: &str, channel: &str, text: &str) -> Result<()> {
        let payload = json!({
            "channel": channel,
            "text": text,
        });
        self.dispatch(token, payload).await
    }

    /// Post one mrkdwn section to a channel. The readable text lives in the
    /// block; the top-level `text` stays empty so clients render the block
    /// alone.
    pub async fn post_section(&self, token: &str, channel: &str, text: &str) -> Result<()> {
        let payload = json!({
            "channel": channel,
            "text": "",
            "blocks": [{
                "type": "section",
                "text": { "type": "mrkdwn", "text": text },
            }],
        });
        self.dispatch(token, payload).await
    }

    async fn dispatch(&self, token: &str, payload: serde_json::Value) -> Result<()> {
        debug!("Posting message to Slack");

        let response = self
            .client
            .post(format!("{}/chat.postMessage", SLACK_API_BASE))
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(anyhow!("chat.postMessage failed: {}", error_text));
        }

        // Slack reports most failures with HTTP 200 and ok=false
        let parsed: PostMessageResponse = response.json().await?;
        if !parsed.ok {
            return Err(anyhow!(
                "chat.postMessage failed: {}",
                parsed.error.unwrap_or("Unknown error".to_string())
            ));
        }

        Ok(())
    }
}

impl Default for SlackClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}
