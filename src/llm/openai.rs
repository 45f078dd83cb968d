//! OpenAI-compatible chat completions with structured outputs

use super::provider::{send_json, LlmProvider, LlmResponse, ProviderSettings};
use super::ProviderKind;
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "You are an expert CMS platform analyst. Respond with a single JSON object matching the provided schema.";

/// Name attached to the structured-output schema
const SCHEMA_NAME: &str = "platform_assessment";

pub struct OpenAiProvider {
    client: Client,
    settings: ProviderSettings,
}

impl OpenAiProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self> {
        let client = settings.http_client(ProviderKind::OpenAi)?;
        Ok(Self { client, settings })
    }

    fn build_request(&self, prompt: &str, schema: &serde_json::Value) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.settings.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            max_tokens: Some(self.settings.max_tokens),
            temperature: Some(self.settings.temperature),
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaSpec {
                    name: SCHEMA_NAME.to_string(),
                    strict: true,
                    schema: schema.clone(),
                },
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn chat(&self, prompt: &str, schema: &serde_json::Value) -> Result<LlmResponse> {
        let key = self.settings.require_key(self.kind())?;
        let request = self.build_request(prompt, schema);

        debug!("Sending chat completion to {}", self.settings.api_url);
        let builder = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(key.expose_secret())
            .json(&request);

        let response: ChatCompletionResponse = send_json(self.kind(), builder).await?;
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| EvalError::RemoteService {
                provider: self.kind().to_string(),
                message: "No choices in response".to_string(),
            })?;

        if let Some(refusal) = message.refusal {
            return Err(EvalError::RemoteService {
                provider: self.kind().to_string(),
                message: format!("Model refused: {}", refusal),
            });
        }

        let raw_text = message.content.ok_or_else(|| EvalError::RemoteService {
            provider: self.kind().to_string(),
            message: "Empty message content".to_string(),
        })?;

        Ok(LlmResponse {
            provider: self.kind(),
            model: self.settings.model.clone(),
            raw_text,
        })
    }

    async fn is_available(&self) -> bool {
        self.settings.api_key.is_some()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaSpec,
}

#[derive(Debug, Serialize)]
struct JsonSchemaSpec {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}
