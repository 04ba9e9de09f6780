//! Command registry
//!
//! Catalog of every command the agent can dispatch. Populated once at
//! startup, read-only afterwards; registration order is preserved because it
//! determines both prompt rendering order and match precedence.

use std::collections::HashMap;

use crate::command::matcher::{self, CompiledMatcher, Invocation};
use crate::command::spec::{CommandHandler, CommandSpec};
use crate::core::error::{EnvoyError, Result};
use crate::prompt::composer;

struct CommandEntry {
    spec: CommandSpec,
    matcher: CompiledMatcher,
    /// Success presentation prompt, rendered once at registration
    result_prompt: String,
    /// Failure presentation prompt, rendered once at registration
    failure_prompt: String,
}

/// Registry of command specs and their bound handlers
///
/// Specs and handlers are registered separately: a spec advertises and
/// matches a command, a handler executes it. Dispatching a matched command
/// with no bound handler is a recoverable failure, not a crash.
#[derive(Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
    by_name: HashMap<String, usize>,
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command spec
    ///
    /// Validates the spec, compiles its matching rule, and renders both
    /// presentation prompts. All failures here are registration-time errors;
    /// a registered command can no longer fail at dispatch time for
    /// definitional reasons.
    pub fn register(&mut self, spec: CommandSpec) -> Result<()> {
        if self.by_name.contains_key(&spec.name) {
            return Err(EnvoyError::DuplicateCommand(spec.name));
        }
        spec.validate().map_err(|errors| {
            EnvoyError::InvalidCommand(format!("{}: {}", spec.name, errors.join("; ")))
        })?;

        let variable_names: Vec<String> =
            spec.variables.iter().map(|v| v.name.clone()).collect();
        let matcher = matcher::compile_matcher(&spec.pattern, &variable_names)?;

        let result_prompt =
            composer::render_examples(&spec.result_template, &spec.success_examples, "result");
        let failure_prompt =
            composer::render_examples(&spec.failure_template, &spec.failure_examples, "error");

        tracing::debug!(command = %spec.name, pattern = %spec.pattern, "registered command");

        self.by_name.insert(spec.name.clone(), self.entries.len());
        self.entries.push(CommandEntry {
            spec,
            matcher,
            result_prompt,
            failure_prompt,
        });
        Ok(())
    }

    /// Bind a handler to a registered command
    pub fn bind_handler<F>(&mut self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(&HashMap<String, String>) -> std::result::Result<String, String>
            + Send
            + Sync
            + 'static,
    {
        if !self.by_name.contains_key(name) {
            return Err(EnvoyError::InvalidCommand(format!(
                "cannot bind handler to unregistered command '{}'",
                name
            )));
        }
        self.handlers.insert(name.to_string(), Box::new(handler));
        Ok(())
    }

    /// Number of registered commands
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Specs in registration order, for prompt construction
    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.entries.iter().map(|entry| &entry.spec)
    }

    /// Get a command spec by name
    pub fn spec(&self, name: &str) -> Option<&CommandSpec> {
        self.entry(name).map(|entry| &entry.spec)
    }

    /// Get a command's pattern by name
    pub fn pattern(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|entry| entry.spec.pattern.as_str())
    }

    /// Rendered (success, failure) presentation prompts for a command
    pub fn prompts(&self, name: &str) -> Option<(&str, &str)> {
        self.entry(name)
            .map(|entry| (entry.result_prompt.as_str(), entry.failure_prompt.as_str()))
    }

    /// Handler bound to a command, if any
    pub fn handler(&self, name: &str) -> Option<&CommandHandler> {
        self.handlers.get(name)
    }

    /// Extract a command invocation from model output, if present
    ///
    /// Locates the first delimited span, then tries each command's rule in
    /// registration order against the full span. The first rule that matches
    /// wins; when two commands share a pattern shape, the earlier-registered
    /// one is always selected. Returns None when the text carries no span or
    /// the span matches no registered pattern.
    pub fn extract_invocation(&self, text: &str) -> Option<Invocation> {
        let span = matcher::find_delimited_span(text)?;
        tracing::debug!(span = %span, "found delimited span");

        for entry in &self.entries {
            if let Some(variables) = entry.matcher.match_span(span) {
                tracing::debug!(command = %entry.spec.name, ?variables, "matched command");
                return Some(Invocation {
                    command: entry.spec.name.clone(),
                    variables,
                });
            }
        }
        tracing::debug!("span matched no registered pattern");
        None
    }

    fn entry(&self, name: &str) -> Option<&CommandEntry> {
        self.by_name.get(name).and_then(|&idx| self.entries.get(idx))
    }
}
