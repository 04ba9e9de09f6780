//! Chat-service trait and message types

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;

use crate::core::config::LlmConfig;
use crate::core::error::Result;

/// One role-tagged message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

/// Generation parameters passed with every completion request.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl From<&LlmConfig> for GenerationParams {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

/// A lazy, finite, non-restartable sequence of text fragments.
///
/// Dropping the stream cancels the underlying request.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// A streaming chat-completion service
///
/// The dispatcher is generic over this trait; tests substitute a scripted
/// stub for the network client.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Request one streamed completion
    ///
    /// Errors returned here, or yielded by the stream, are service failures:
    /// fatal for the turn and propagated to the caller.
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<TokenStream>;
}

#[async_trait]
impl<S: ChatService> ChatService for std::sync::Arc<S> {
    async fn stream_chat(
        &self,
        messages: Vec<ChatMessage>,
        params: &GenerationParams,
    ) -> Result<TokenStream> {
        (**self).stream_chat(messages, params).await
    }
}
