//! Async streaming LLM client
//!
//! Model-agnostic HTTP client for chat-completion APIs. Supports both the
//! Anthropic Messages API and OpenAI-compatible APIs (DeepSeek, etc), with
//! the wire format detected from the endpoint URL. Completions are consumed
//! as server-sent events and surfaced as a stream of text deltas.

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::future::ready;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::core::config::LlmConfig;
use crate::core::error::{EnvoyError, Result};
use crate::llm::service::{ChatMessage, ChatService, GenerationParams, TokenStream};

/// API format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFormat {
    Anthropic,
    OpenAI,
}

/// Streaming HTTP client for a hosted language-model service
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    api_format: ApiFormat,
}

impl LlmClient {
    /// Create a new client with explicit configuration
    pub fn new(api_key: String, api_url: String) -> Self {
        let api_format = Self::detect_api_format(&api_url);
        Self {
            client: Client::new(),
            api_key,
            api_url,
            api_format,
        }
    }

    /// Detect API format from URL
    fn detect_api_format(url: &str) -> ApiFormat {
        if url.contains("anthropic.com") {
            ApiFormat::Anthropic
        } else {
            // DeepSeek, OpenAI, and other compatible APIs use OpenAI format
            ApiFormat::OpenAI
        }
    }

    /// Create a client from environment variables
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to the Anthropic Messages endpoint)
    pub fn from_env() -> Result<Self> {
        let config = LlmConfig::from_env()?;
        Ok(Self::from_config(&config))
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(config.api_key.clone(), config.api_url.clone())
    }

    pub fn api_format(&self) -> ApiFormat {
        self.api_format
    }

    async fn stream_anthropic(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<TokenStream> {
        let (system, messages) = partition_system(messages);
        let request = AnthropicRequest {
            model: params.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: true,
            system,
            messages,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EnvoyError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnvoyError::LlmError(format!("API error: {}", error_text)));
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let stop = matches!(event, Ok(ev) if ev.event == "message_stop");
                ready(!stop)
            })
            .filter_map(|event| {
                ready(match event {
                    Ok(ev) => match ev.event.as_str() {
                        "content_block_delta" => {
                            match serde_json::from_str::<AnthropicStreamEvent>(&ev.data) {
                                Ok(parsed) => parsed
                                    .delta
                                    .and_then(|delta| delta.text)
                                    .filter(|text| !text.is_empty())
                                    .map(Ok),
                                // Unrecognized delta payloads are skipped
                                Err(_) => None,
                            }
                        }
                        "error" => Some(Err(EnvoyError::LlmError(ev.data))),
                        // ping, message_start, content_block_start, message_delta
                        _ => None,
                    },
                    Err(e) => Some(Err(EnvoyError::LlmError(e.to_string()))),
                })
            });

        Ok(Box::pin(stream))
    }

    async fn stream_openai(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<TokenStream> {
        let request = OpenAiRequest {
            model: params.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: true,
            messages,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| EnvoyError::LlmError(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EnvoyError::LlmError(format!("API error: {}", error_text)));
        }

        let stream = response
            .bytes_stream()
            .eventsource()
            .take_while(|event| {
                let done = matches!(event, Ok(ev) if ev.data == "[DONE]");
                ready(!done)
            })
            .filter_map(|event| {
                ready(match event {
                    Ok(ev) => match serde_json::from_str::<OpenAiStreamChunk>(&ev.data) {
                        Ok(chunk) => chunk
                            .choices
                            .into_iter()
                            .next()
                            .and_then(|choice| choice.delta.content)
                            .filter(|text| !text.is_empty())
                            .map(Ok),
                        // Keep-alives and unrecognized payloads are skipped
                        Err(_) => None,
                    },
                    Err(e) => Some(Err(EnvoyError::LlmError(e.to_string()))),
                })
            });

        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl ChatService for LlmClient {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<TokenStream> {
        match self.api_format {
            ApiFormat::Anthropic => self.stream_anthropic(messages, params).await,
            ApiFormat::OpenAI => self.stream_openai(messages, params).await,
        }
    }
}

/// Split system-role messages out of the list; the Anthropic API carries
/// system text in a dedicated request field.
fn partition_system(messages: Vec<ChatMessage>) -> (String, Vec<ChatMessage>) {
    let mut system = String::new();
    let mut rest = Vec::new();
    for message in messages {
        if message.role == "system" {
            if !system.is_empty() {
                system.push_str("\n\n");
            }
            system.push_str(&message.content);
        } else {
            rest.push(message);
        }
    }
    (system, rest)
}

// Anthropic API format
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    system: String,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct AnthropicStreamEvent {
    delta: Option<AnthropicDelta>,
}

#[derive(Deserialize)]
struct AnthropicDelta {
    text: Option<String>,
}

// OpenAI-compatible API format (DeepSeek, OpenAI, etc.)
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiDelta,
}

#[derive(Deserialize)]
struct OpenAiDelta {
    #[serde(default)]
    content: Option<String>,
}
