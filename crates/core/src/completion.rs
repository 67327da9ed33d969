use crate::error::BackendError;
use crate::traits::CompletionModel;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

/// Single-turn completion against an OpenAI-compatible
/// `chat/completions` endpoint.
pub struct ChatCompletionClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, BackendError> {
        // A trailing slash keeps Url::join from replacing the last path
        // segment of endpoints like ".../openai/v1".
        let endpoint = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };

        Ok(Self {
            client: Client::new(),
            endpoint: Url::parse(&endpoint)?,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl CompletionModel for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let url = self.endpoint.join("chat/completions")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{ "role": "user", "content": prompt }],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BackendError::BackendResponse {
                backend: "completion".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parsed
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .map(|content| content.to_string())
            .ok_or_else(|| BackendError::BackendResponse {
                backend: "completion".to_string(),
                details: "response carried no message content".to_string(),
            })
    }
}
