//! Anthropic Messages API
//!
//! The Messages API has no schema-constrained mode, so the schema is
//! appended to the prompt and the reply is parsed leniently.

use super::provider::{extract_json, send_json, LlmProvider, LlmResponse, ProviderSettings};
use super::ProviderKind;
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    settings: ProviderSettings,
}

impl AnthropicProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = settings.http_client(ProviderKind::Anthropic)?;
        Ok(Self { client, settings })
    }

    fn build_request(&self, prompt: &str, schema: &serde_json::Value) -> Result<MessagesRequest> {
        let schema_text = serde_json::to_string_pretty(schema).map_err(|e| {
            EvalError::invalid(format!("Schema is not serializable: {}", e))
        })?;

        Ok(MessagesRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            messages: vec![Message {
                role: "user".to_string(),
                content: format!(
                    "{}\n\nRespond ONLY with valid JSON matching this schema:\n{}",
                    prompt, schema_text
                ),
            }],
        })
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn chat(&self, prompt: &str, schema: &serde_json::Value) -> Result<LlmResponse> {
        let key = self.settings.require_key(self.kind())?;
        let request = self.build_request(prompt, schema)?;

        debug!("Sending message to {}", self.settings.api_url);
        let builder = self
            .client
            .post(&self.settings.api_url)
            .header("x-api-key", key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request);

        let response: MessagesResponse = send_json(self.kind(), builder).await?;
        let text = response
            .content
            .into_iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| EvalError::RemoteService {
                provider: self.kind().to_string(),
                message: "No text block in response".to_string(),
            })?;

        Ok(LlmResponse {
            provider: self.kind(),
            model: self.settings.model.clone(),
            raw_text: extract_json(&text).to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        self.settings.api_key.is_some()
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use serde_json::json;
    use std::time::Duration;

    fn settings(url: String) -> ProviderSettings {
        ProviderSettings {
            model: "claude-3-5-sonnet-20241022".to_string(),
            api_url: url,
            api_key: Some(SecretString::new("ak-test".to_string())),
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            timeout: Duration::from_secs(5),
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    #[test]
    fn test_prompt_embeds_schema() {
        let provider = AnthropicProvider::new(settings("http://localhost".into())).unwrap();
        let request = provider
            .build_request("rate Liferay", &json!({"required": ["platform"]}))
            .unwrap();
        let content = &request.messages[0].content;
        assert!(content.starts_with("rate Liferay"));
        assert!(content.contains("Respond ONLY with valid JSON"));
        assert!(content.contains("\"platform\""));
    }

    #[tokio::test]
    async fn test_chat_strips_fences() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "ak-test")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"content":[{"type":"text","text":"```json\n{\"platform\":\"Liferay\"}\n```"}]}"#,
            )
            .create_async()
            .await;

        let provider = AnthropicProvider::new(settings(format!("{}/v1/messages", server.url()))).unwrap();
        let response = provider.chat("prompt", &json!({})).await.unwrap();
        assert_eq!(response.raw_text, "{\"platform\":\"Liferay\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_remote_service() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body("overloaded")
            .create_async()
            .await;

        let provider = AnthropicProvider::new(settings(format!("{}/v1/messages", server.url()))).unwrap();
        let err = provider.chat("prompt", &json!({})).await.unwrap_err();
        assert!(matches!(err, EvalError::RemoteService { .. }));
        assert!(err.to_string().contains("overloaded"));
    }
}
