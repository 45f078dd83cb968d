//! Provider trait and the HTTP plumbing shared by the backends

use super::ProviderKind;
use crate::config::LlmConfig;
use crate::error::{EvalError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Raw model output for one request
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub provider: ProviderKind,
    pub model: String,
    /// Model text, expected to hold a single JSON document
    pub raw_text: String,
}

/// A chat backend that answers a prompt with JSON shaped by `schema`
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn model(&self) -> &str;

    /// Display name, e.g. `openai (gpt-4o-mini)`
    fn name(&self) -> String {
        format!("{} ({})", self.kind(), self.model())
    }

    /// Send `prompt` requesting a response conforming to `schema`
    async fn chat(&self, prompt: &str, schema: &serde_json::Value) -> Result<LlmResponse>;

    /// Whether the provider can be used right now (key present, server reachable)
    async fn is_available(&self) -> bool;
}

/// Settings common to every backend
#[derive(Debug)]
pub struct ProviderSettings {
    pub model: String,
    pub api_url: String,
    pub api_key: Option<SecretString>,
    /// Variable the key was read from, for error messages
    pub api_key_env: Option<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ProviderSettings {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model(),
            api_url: config.api_url(),
            api_key: config.api_key(),
            api_key_env: config.api_key_env(),
            timeout: config.timeout(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub(crate) fn http_client(&self, kind: ProviderKind) -> Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| EvalError::RemoteService {
                provider: kind.to_string(),
                message: format!("Failed to build HTTP client: {}", e),
            })
    }

    pub(crate) fn require_key(&self, kind: ProviderKind) -> Result<&SecretString> {
        self.api_key.as_ref().ok_or_else(|| {
            EvalError::Config(format!(
                "{} requires an API key; set {}",
                kind,
                self.api_key_env.as_deref().unwrap_or("llm.api_key_env")
            ))
        })
    }
}

/// Send a request and decode a JSON body, mapping transport and status
/// failures onto the error taxonomy
pub(crate) async fn send_json<R: DeserializeOwned>(
    kind: ProviderKind,
    request: RequestBuilder,
) -> Result<R> {
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(kind.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        warn!("{} returned {}", kind, status);
        return Err(status_error(kind.as_str(), status, body));
    }

    debug!("{} responded {}", kind, status);
    response.json::<R>().await.map_err(|e| EvalError::RemoteService {
        provider: kind.to_string(),
        message: format!("Invalid response body: {}", e),
    })
}

/// Failure before any status arrived; `service` names the remote end
pub(crate) fn transport_error(service: &str, e: reqwest::Error) -> EvalError {
    if e.is_timeout() {
        EvalError::Timeout {
            provider: service.to_string(),
            message: e.to_string(),
        }
    } else {
        EvalError::RemoteService {
            provider: service.to_string(),
            message: format!("Request failed: {}", e),
        }
    }
}

pub(crate) fn status_error(service: &str, status: StatusCode, body: String) -> EvalError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        EvalError::RateLimit {
            provider: service.to_string(),
            message: format!("Status {}: {}", status, body),
        }
    } else {
        EvalError::RemoteService {
            provider: service.to_string(),
            message: format!("Status {}: {}", status, body),
        }
    }
}

/// Pull the JSON document out of model text, tolerating markdown fences
/// and leading prose
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}
