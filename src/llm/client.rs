//! HTTP completion provider
//!
//! Model-agnostic client for Anthropic-style and OpenAI-compatible APIs.
//! Reply fields are located with JSON pointers from [`ProviderConfig`], so a
//! new vendor usually needs configuration, not code.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::error::{ColonyError, Result};
use crate::llm::provider::{
    ApiFormat, CompletionProvider, ProviderConfig, ProviderReply, RateLimit, TokenUsage,
};

pub struct HttpProvider {
    client: Client,
    config: ProviderConfig,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a provider from environment variables
    ///
    /// See [`ProviderConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ProviderConfig::from_env()?))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn request_body(&self, system: &str, user: &str) -> Value {
        match self.config.format {
            ApiFormat::Anthropic => json!({
                "model": self.config.model,
                "max_tokens": self.config.max_tokens,
                "system": system,
                "messages": [{ "role": "user", "content": user }],
            }),
            ApiFormat::OpenAi => json!({
                "model": self.config.model,
                "max_tokens": self.config.max_tokens,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": user },
                ],
            }),
        }
    }
}

/// Pull text and usage out of a raw reply body
pub fn extract_reply(config: &ProviderConfig, body: &Value) -> Result<ProviderReply> {
    let text = body
        .pointer(&config.text_pointer)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ColonyError::LlmError(format!("reply has no text at {}", config.text_pointer))
        })?;

    // Missing usage is tolerated; it only feeds counters
    let count = |pointer: &str| body.pointer(pointer).and_then(Value::as_u64).unwrap_or(0);
    let usage = TokenUsage {
        input_tokens: count(&config.input_tokens_pointer),
        output_tokens: count(&config.output_tokens_pointer),
    };

    Ok(ProviderReply {
        text: text.to_string(),
        usage,
    })
}

#[async_trait]
impl CompletionProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn rate_limit(&self) -> RateLimit {
        self.config.rate_limit
    }

    async fn complete(&self, system: &str, user: &str) -> Result<ProviderReply> {
        let request = self.client.post(&self.config.endpoint);
        let request = match self.config.format {
            ApiFormat::Anthropic => request
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", "2023-06-01"),
            ApiFormat::OpenAi => {
                request.header("Authorization", format!("Bearer {}", self.config.api_key))
            }
        };

        let response = request
            .header("content-type", "application/json")
            .json(&self.request_body(system, user))
            .send()
            .await
            .map_err(|e| ColonyError::LlmError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ColonyError::LlmError(format!(
                "API error {}: {}",
                status, error_text
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| ColonyError::LlmError(e.to_string()))?;

        extract_reply(&self.config, &body)
    }
}
