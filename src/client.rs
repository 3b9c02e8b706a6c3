//! Completion provider client.
//!
//! Defines the [`CompletionClient`] trait the pipeline depends on, plus an
//! OpenAI-compatible HTTP implementation. Steps never talk to the provider
//! directly — they build a prompt and hand it to the
//! [`StepExecutor`](crate::StepExecutor), which drives the client through
//! the retry policy.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::Retryable;

/// Errors from a completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("http error: {0}")]
    Http(String),

    /// Non-success HTTP status from the provider.
    #[error("provider returned HTTP {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The response decoded but did not contain a completion.
    #[error("response error: {0}")]
    Response(String),

    /// The response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Retryable for CompletionError {
    fn is_transient(&self) -> bool {
        match self {
            CompletionError::Http(_) => true,
            CompletionError::Status { status, .. } => *status == 429 || *status >= 500,
            CompletionError::Response(_) | CompletionError::Serialization(_) => false,
        }
    }
}

/// A client capable of turning one prompt into one text completion.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Perform one completion call. May fail transiently or permanently;
    /// the caller decides whether to retry.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Identifier of the underlying model, used as a span attribute.
    fn model(&self) -> &str;
}

#[async_trait]
impl CompletionClient for Arc<dyn CompletionClient> {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        (**self).complete(prompt).await
    }

    fn model(&self) -> &str {
        (**self).model()
    }
}

/// Configuration for the OpenAI-compatible HTTP client.
#[derive(Debug, Clone)]
pub struct OpenAiClientConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Bearer credential for the provider.
    pub api_key: String,
    /// Model identifier to request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl OpenAiClientConfig {
    /// Config with provider defaults, ready for an API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            timeout_secs: 30,
        }
    }
}

/// HTTP completion client for an OpenAI-compatible `chat/completions` API.
pub struct OpenAiClient {
    client: reqwest::Client,
    config: OpenAiClientConfig,
}

impl OpenAiClient {
    /// Build a client from the given config.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::Http`] if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: OpenAiClientConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CompletionError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: String,
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|e| CompletionError::Http(e.to_string()))?,
        );

        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        let text = response
            .text()
            .await
            .map_err(|e| CompletionError::Http(e.to_string()))?;
        let parsed: ChatResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::Serialization(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| CompletionError::Response("missing choices".to_string()))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_serialization() {
        let body = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Summarize this".to_string(),
            }],
            temperature: 0.1,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Summarize this");
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"An answer."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "An answer.");
    }

    #[test]
    fn test_error_classification() {
        assert!(CompletionError::Http("timeout".into()).is_transient());
        assert!(CompletionError::Status { status: 429, body: String::new() }.is_transient());
        assert!(CompletionError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!CompletionError::Status { status: 401, body: String::new() }.is_transient());
        assert!(!CompletionError::Response("missing choices".into()).is_transient());
    }
}
