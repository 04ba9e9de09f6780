//! Turn orchestration
//!
//! One dispatch call is a two-phase protocol against the model service:
//!
//! 1. Detect phase: the system instruction advertises every registered
//!    command; the completion is fully buffered, never shown to the caller,
//!    and scanned for a command instance.
//! 2. Present phase: after executing the matched handler, a second
//!    completion renders the outcome (or failure) conversationally and is
//!    streamed to the caller chunk by chunk.
//!
//! When the detect phase yields no command, its buffered text is the reply
//! and no second request is made. Handler problems never abort the turn;
//! they are routed through the failure-branch prompt. Only a missing
//! registry and service failures surface as errors.

use std::sync::Arc;

use futures::stream;
use futures::StreamExt;

use crate::command::matcher::{self, Invocation};
use crate::command::registry::CommandRegistry;
use crate::core::error::{EnvoyError, Result};
use crate::llm::service::{ChatMessage, ChatService, GenerationParams, TokenStream};
use crate::prompt::composer::PromptComposer;

/// Outcome of the detect phase
enum DetectOutcome {
    /// No command instance in the buffered completion; the text is the reply
    Plain(String),
    /// A command instance was extracted
    Command(Invocation),
}

/// Outcome of executing a matched command
enum Execution {
    Success(String),
    Failure(String),
}

/// Conversational agent that dispatches pattern-matched commands
///
/// Generic over the chat service so turns can be driven against a stub in
/// tests. The registry is installed once at startup; after that the agent is
/// read-only and an `Arc<Agent<_>>` can serve concurrent turns.
pub struct Agent<S: ChatService> {
    service: S,
    composer: PromptComposer,
    params: GenerationParams,
    registry: Option<Arc<CommandRegistry>>,
}

impl<S: ChatService> Agent<S> {
    /// Create an agent with its purpose, chat service, and generation
    /// parameters. No registry is installed yet; `dispatch` fails with
    /// `NotInitialized` until `install_registry` is called.
    pub fn new(agent_purpose: impl Into<String>, service: S, params: GenerationParams) -> Self {
        Self {
            service,
            composer: PromptComposer::new(agent_purpose),
            params,
            registry: None,
        }
    }

    /// Install the command registry
    ///
    /// Must be called before the first dispatch. The registry is treated as
    /// read-only from here on.
    pub fn install_registry(&mut self, registry: CommandRegistry) {
        self.registry = Some(Arc::new(registry));
    }

    /// Process one user turn
    ///
    /// Returns the user-visible reply as a lazy, finite stream of text
    /// fragments. Dropping the stream cancels the underlying request.
    ///
    /// # Errors
    /// `NotInitialized` when no registry is installed (checked before any
    /// network interaction), or `LlmError` when the model service fails.
    pub async fn dispatch(&self, user_input: &str) -> Result<TokenStream> {
        let registry = self
            .registry
            .as_ref()
            .ok_or(EnvoyError::NotInitialized)?
            .clone();

        match self.detect_phase(&registry, user_input).await? {
            DetectOutcome::Plain(text) => {
                tracing::debug!("no command detected, replying with phase-1 text");
                let reply: TokenStream = Box::pin(stream::once(async move { Ok(text) }));
                Ok(reply)
            }
            DetectOutcome::Command(invocation) => {
                tracing::info!(command = %invocation.command, "dispatching command");
                let execution = execute_command(&registry, &invocation);
                self.present_phase(&registry, &invocation.command, execution)
                    .await
            }
        }
    }

    /// Phase 1: request a completion and scan it for a command instance
    ///
    /// The stream is drained into a buffer before matching; command
    /// detection needs the complete text, so nothing is yielded to the
    /// caller from this phase.
    async fn detect_phase(
        &self,
        registry: &CommandRegistry,
        user_input: &str,
    ) -> Result<DetectOutcome> {
        let messages = vec![
            ChatMessage::system(self.composer.system_instruction(registry)),
            ChatMessage::user(user_input),
        ];

        let mut stream = self.service.stream_chat(messages, &self.params).await?;
        let mut buffer = String::new();
        while let Some(chunk) = stream.next().await {
            buffer.push_str(&chunk?);
        }
        tracing::debug!(buffer = %buffer, "phase-1 completion buffered");

        match registry.extract_invocation(&buffer) {
            Some(invocation) => Ok(DetectOutcome::Command(invocation)),
            None => {
                if matcher::find_delimited_span(&buffer).is_some() {
                    // Unmatched spans are passed through to the user as-is
                    tracing::warn!("delimited span matched no registered command");
                }
                Ok(DetectOutcome::Plain(buffer))
            }
        }
    }

    /// Phase 2: render the execution outcome conversationally
    ///
    /// Uses the command's cached presentation prompt (success or failure
    /// variant) as system context and streams the completion live.
    async fn present_phase(
        &self,
        registry: &CommandRegistry,
        command: &str,
        execution: Execution,
    ) -> Result<TokenStream> {
        let (result_prompt, failure_prompt) = registry.prompts(command).ok_or_else(|| {
            EnvoyError::InvalidCommand(format!("command '{}' is not registered", command))
        })?;

        let (system, user) = match execution {
            Execution::Success(result) => {
                tracing::debug!(command = %command, "handler succeeded");
                (
                    result_prompt.to_string(),
                    format!("Format this result: {}", result),
                )
            }
            Execution::Failure(error) => {
                tracing::debug!(command = %command, error = %error, "handler failed");
                (
                    failure_prompt.to_string(),
                    format!("Handle this error: {}", error),
                )
            }
        };

        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        self.service.stream_chat(messages, &self.params).await
    }
}

/// Execute a matched command against its bound handler
///
/// Every failure mode here is recoverable: a missing handler and a handler
/// error both become failure-branch messages, never errors.
fn execute_command(registry: &CommandRegistry, invocation: &Invocation) -> Execution {
    let Some(handler) = registry.handler(&invocation.command) else {
        return Execution::Failure(format!(
            "No handler registered for command: {}",
            invocation.command
        ));
    };

    match handler(&invocation.variables) {
        Ok(result) => Execution::Success(result),
        Err(message) => Execution::Failure(format!("Error executing command: {}", message)),
    }
}
