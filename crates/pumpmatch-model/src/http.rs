//! HTTP adapters for hosted chat-completion APIs.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use async_trait::async_trait;

use crate::client::{ModelClient, ModelError, ModelRequest, ModelResponse};

const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Shared configuration for HTTP-backed clients.
#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    pub api_key: String,
    pub model: String,
    /// Endpoint override; the provider default is used when absent.
    pub endpoint: Option<String>,
    /// Per-request deadline. Latency is user-facing, so keep this in
    /// single-digit seconds.
    pub timeout: Duration,
}

impl HttpClientConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: None,
            timeout: Duration::from_secs(8),
        }
    }
}

fn build_http_client(timeout: Duration) -> Result<Client, ModelError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ModelError::Transport(format!("failed to build HTTP client: {e}")))
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout(timeout)
    } else {
        ModelError::Transport(err.to_string())
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    let mut chars = value.chars();
    let truncated: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{truncated}...")
    } else {
        truncated
    }
}

// --- OpenAI-style chat completions ---------------------------------------

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    content: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

fn extract_text(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

/// OpenAI-compatible chat-completions client.
#[derive(Debug)]
pub struct OpenAiClient {
    http: Client,
    config: HttpClientConfig,
}

impl OpenAiClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ModelError> {
        if config.api_key.is_empty() {
            return Err(ModelError::NotConfigured("openai api_key is empty".into()));
        }
        let http = build_http_client(config.timeout)?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_OPENAI_ENDPOINT);
        if endpoint.contains("/chat/completions") {
            endpoint.to_string()
        } else {
            format!("{}/chat/completions", endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let mut messages = Vec::new();
        if let Some(system) = request.system.as_deref() {
            if !system.trim().is_empty() {
                messages.push(json!({ "role": "system", "content": system }));
            }
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let payload = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Http {
                status,
                detail: truncate(&body, 320),
            });
        }

        let body: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("invalid openai response: {e}")))?;

        let choice = body
            .choices
            .first()
            .ok_or_else(|| ModelError::InvalidResponse("response did not include choices".into()))?;

        Ok(ModelResponse::new(extract_text(&choice.message.content)))
    }
}

// --- Anthropic messages API ----------------------------------------------

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

/// Anthropic messages-API client.
pub struct AnthropicClient {
    http: Client,
    config: HttpClientConfig,
}

impl AnthropicClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, ModelError> {
        if config.api_key.is_empty() {
            return Err(ModelError::NotConfigured(
                "anthropic api_key is empty".into(),
            ));
        }
        let http = build_http_client(config.timeout)?;
        Ok(Self { http, config })
    }

    fn endpoint(&self) -> String {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ANTHROPIC_ENDPOINT);
        if endpoint.ends_with("/messages") {
            endpoint.to_string()
        } else {
            format!("{}/messages", endpoint.trim_end_matches('/'))
        }
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let mut payload = json!({
            "model": self.config.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [
                { "role": "user", "content": request.prompt }
            ],
        });
        if let Some(system) = request.system.as_deref() {
            if !system.trim().is_empty() {
                payload["system"] = json!(system);
            }
        }

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_send_error(e, self.config.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Http {
                status,
                detail: truncate(&body, 320),
            });
        }

        let body: AnthropicResponse = response.json().await.map_err(|e| {
            ModelError::InvalidResponse(format!("invalid anthropic response: {e}"))
        })?;

        let text = body
            .content
            .iter()
            .filter(|part| part.content_type == "text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ModelResponse::new(text.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_endpoint_resolution() {
        let mut config = HttpClientConfig::new("key", "model");
        let client = OpenAiClient::new(config.clone()).unwrap();
        assert_eq!(client.endpoint(), DEFAULT_OPENAI_ENDPOINT);

        config.endpoint = Some("https://proxy.example/v1".into());
        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "https://proxy.example/v1/chat/completions");
    }

    #[test]
    fn anthropic_endpoint_resolution() {
        let mut config = HttpClientConfig::new("key", "model");
        config.endpoint = Some("https://proxy.example/".into());
        let client = AnthropicClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "https://proxy.example/messages");
    }

    #[test]
    fn empty_api_key_is_not_configured() {
        let err = OpenAiClient::new(HttpClientConfig::new("", "model")).unwrap_err();
        assert!(matches!(err, ModelError::NotConfigured(_)));
    }

    #[test]
    fn extract_text_handles_both_shapes() {
        assert_eq!(extract_text(&json!("plain")), "plain");
        let parts = json!([{ "text": "a" }, { "text": "b" }]);
        assert_eq!(extract_text(&parts), "a\nb");
    }
}
