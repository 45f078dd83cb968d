//! Local Ollama server, `/api/chat` with a JSON schema `format`

use super::provider::{extract_json, send_json, LlmProvider, LlmResponse, ProviderSettings};
use super::ProviderKind;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Probe timeout for `is_available`
const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);

pub struct OllamaProvider {
    client: Client,
    settings: ProviderSettings,
}

impl OllamaProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = settings.http_client(ProviderKind::Ollama)?;
        Ok(Self { client, settings })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.settings.api_url.trim_end_matches('/'), path)
    }

    fn build_request(&self, prompt: &str, schema: &serde_json::Value) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.settings.model.clone(),
            messages: vec![OllamaMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            format: schema.clone(),
            options: OllamaOptions {
                temperature: self.settings.temperature,
                num_predict: self.settings.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Ollama
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn chat(&self, prompt: &str, schema: &serde_json::Value) -> Result<LlmResponse> {
        let url = self.endpoint("/api/chat");
        debug!("Sending chat to {}", url);

        let builder = self.client.post(&url).json(&self.build_request(prompt, schema));
        let response: OllamaChatResponse = send_json(self.kind(), builder).await?;

        Ok(LlmResponse {
            provider: self.kind(),
            model: self.settings.model.clone(),
            raw_text: extract_json(&response.message.content).to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        match self
            .client
            .get(self.endpoint("/api/tags"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Ollama not reachable: {}", e);
                false
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    format: serde_json::Value,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}
