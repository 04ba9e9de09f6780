//! Runtime configuration for the language-model service
//!
//! All tunables are collected here with their defaults. Configuration is
//! environment-driven; nothing is read from disk.

use crate::core::error::{EnvoyError, Result};

/// Default endpoint when `LLM_API_URL` is not set.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Default model when `LLM_MODEL` is not set.
///
/// A small, fast model is the right default: phase-1 output is a single
/// command token or a short conversational reply.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Default output cap when `LLM_MAX_TOKENS` is not set.
///
/// Generous enough for the presentation phase, which rewrites a command
/// outcome into a few paragraphs of prose.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default sampling temperature when `LLM_TEMPERATURE` is not set.
///
/// 0.7 keeps the presentation phase varied without making the detection
/// phase drift from the exact-pattern directive.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Connection settings for the hosted language-model service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key sent with every request
    pub api_key: String,
    /// Chat-completion endpoint URL
    pub api_url: String,
    /// Model identifier passed per request
    pub model: String,
    /// Upper bound on generated tokens per completion
    pub max_tokens: u32,
    /// Sampling temperature for both phases
    pub temperature: f32,
}

impl LlmConfig {
    /// Load configuration from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL, LLM_MODEL, LLM_MAX_TOKENS, LLM_TEMPERATURE
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| EnvoyError::LlmError("LLM_API_KEY not set".into()))?;
        let api_url = std::env::var("LLM_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        let temperature = std::env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TEMPERATURE);

        Ok(Self {
            api_key,
            api_url,
            model,
            max_tokens,
            temperature,
        })
    }
}
