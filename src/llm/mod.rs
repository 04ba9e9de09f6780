//! Language-model service boundary
//!
//! The dispatcher consumes an opaque streaming chat-completion service
//! through the `ChatService` trait; `LlmClient` is the HTTP implementation.

pub mod client;
pub mod service;

pub use client::{ApiFormat, LlmClient};
pub use service::{ChatMessage, ChatService, GenerationParams, TokenStream};
