//! Completion provider contract
//!
//! The decision system only needs "send a system and a user message, get text
//! back". Vendor details live behind [`CompletionProvider`]; the HTTP
//! implementation is in [`crate::llm::client`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::{ColonyError, Result};

/// Request budget advertised by a provider; 0 means unlimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RateLimit {
    pub requests_per_minute: u32,
    pub requests_per_day: u32,
}

impl RateLimit {
    pub const UNLIMITED: RateLimit = RateLimit {
        requests_per_minute: 0,
        requests_per_day: 0,
    };

    pub fn new(requests_per_minute: u32, requests_per_day: u32) -> Self {
        Self {
            requests_per_minute,
            requests_per_day,
        }
    }
}

/// Tokens billed for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub text: String,
    pub usage: TokenUsage,
}

/// Wire format of the completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFormat {
    Anthropic,
    OpenAi,
}

impl ApiFormat {
    /// Guess the format from the endpoint URL
    pub fn detect(url: &str) -> Self {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // Most other vendors speak the OpenAI chat format
            ApiFormat::OpenAi
        }
    }

    /// JSON pointers to the reply text and token counts
    fn default_pointers(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            ApiFormat::Anthropic => (
                "/content/0/text",
                "/usage/input_tokens",
                "/usage/output_tokens",
            ),
            ApiFormat::OpenAi => (
                "/choices/0/message/content",
                "/usage/prompt_tokens",
                "/usage/completion_tokens",
            ),
        }
    }
}

/// Everything needed to talk to one completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub rate_limit: RateLimit,
    pub format: ApiFormat,
    /// JSON pointer to the reply text
    pub text_pointer: String,
    pub input_tokens_pointer: String,
    pub output_tokens_pointer: String,
}

pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

impl ProviderConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let format = ApiFormat::detect(&endpoint);
        let (text, input, output) = format.default_pointers();
        Self {
            endpoint,
            api_key: api_key.into(),
            model: model.into(),
            // Decisions are a few sentences of JSON
            max_tokens: 400,
            rate_limit: RateLimit::UNLIMITED,
            format,
            text_pointer: text.to_string(),
            input_tokens_pointer: input.to_string(),
            output_tokens_pointer: output.to_string(),
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Build from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL, LLM_MODEL, LLM_RPM, LLM_RPD
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ColonyError::LlmError("LLM_API_KEY not set".into()))?;
        let endpoint = std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let rpm = env_u32("LLM_RPM")?;
        let rpd = env_u32("LLM_RPD")?;

        Ok(Self::new(endpoint, api_key, model).with_rate_limit(RateLimit::new(rpm, rpd)))
    }
}

fn env_u32(key: &str) -> Result<u32> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ColonyError::Config(format!("{} must be a whole number, got {:?}", key, raw))),
        Err(_) => Ok(0),
    }
}

/// An external text-completion service
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &str;

    fn rate_limit(&self) -> RateLimit;

    async fn complete(&self, system: &str, user: &str) -> Result<ProviderReply>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection_picks_pointers() {
        let anthropic = ProviderConfig::new(DEFAULT_ENDPOINT, "k", "m");
        assert_eq!(anthropic.format, ApiFormat::Anthropic);
        assert_eq!(anthropic.text_pointer, "/content/0/text");

        let openai = ProviderConfig::new("https://api.deepseek.com/chat/completions", "k", "m");
        assert_eq!(openai.format, ApiFormat::OpenAi);
        assert_eq!(openai.input_tokens_pointer, "/usage/prompt_tokens");
        assert_eq!(openai.rate_limit, RateLimit::UNLIMITED);
    }

    #[test]
    fn test_usage_total() {
        let usage = TokenUsage {
            input_tokens: 120,
            output_tokens: 30,
        };
        assert_eq!(usage.total(), 150);
    }
}
