//! Static command metadata
//!
//! A `CommandSpec` carries everything the agent needs to advertise, match,
//! execute, and present one command: the bracketed pattern, its variables,
//! example inputs for the detection prompt, and the templates plus literal
//! example outcomes that seed the presentation prompts.

use std::collections::HashMap;

use crate::command::matcher;

/// Metadata for one substitution slot in a command pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    /// Name as used in the pattern, e.g. `user_id` in `{user_id}`
    pub name: String,
    /// What the variable represents
    pub description: String,
    /// Example value shown to the model
    pub example: String,
}

/// A literal example outcome paired with the narrative the model should
/// imitate when presenting a similar outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseExample {
    pub outcome: String,
    pub narrative: String,
}

/// Handler bound to a command name.
///
/// Receives the variable bindings extracted from the matched pattern and
/// returns a result message, or an error message on failure. Handler errors
/// are recovered by the dispatcher and routed through the failure-branch
/// prompt; they never abort the turn.
pub type CommandHandler =
    Box<dyn Fn(&HashMap<String, String>) -> std::result::Result<String, String> + Send + Sync>;

/// Static metadata for one invocable command.
///
/// Specs are plain data, constructed literally and registered through
/// `CommandRegistry::register`, which validates them. Immutable once
/// registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Unique registry key
    pub name: String,
    /// Short description of what the command does
    pub description: String,
    /// Detailed explanation shown in the detection prompt
    pub explanation: String,
    /// Bracketed pattern with `{var}` placeholders, e.g. `[[GENERATE_WALLET_{user_id}]]`
    pub pattern: String,
    /// Variables used in the pattern, one per placeholder
    pub variables: Vec<VariableSpec>,
    /// Natural-language inputs that should trigger this command
    pub example_inputs: Vec<String>,
    /// Template for the success presentation prompt; must contain `{examples}`
    pub result_template: String,
    /// Template for the failure presentation prompt; must contain `{examples}`
    pub failure_template: String,
    pub success_examples: Vec<ResponseExample>,
    pub failure_examples: Vec<ResponseExample>,
}

impl CommandSpec {
    /// Validate the spec, collecting every problem found
    ///
    /// Checked here: delimiter wrapping, variable name syntax and
    /// uniqueness, exact correspondence between `{var}` placeholders and
    /// declared variables, and the `{examples}` slot in both templates.
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.name.is_empty() {
            errors.push("command name must not be empty".to_string());
        }

        if !(self.pattern.starts_with("[[") && self.pattern.ends_with("]]")) {
            errors.push(format!("pattern '{}' must be wrapped in [[ ]]", self.pattern));
        }

        for var in &self.variables {
            if !matcher::is_valid_variable_name(&var.name) {
                errors.push(format!("invalid variable name '{}'", var.name));
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for var in &self.variables {
            if seen.contains(&var.name.as_str()) {
                errors.push(format!("duplicate variable '{}'", var.name));
            }
            seen.push(var.name.as_str());
        }

        let placeholders = matcher::placeholder_names(&self.pattern);
        for name in &placeholders {
            if !self.variables.iter().any(|v| &v.name == name) {
                errors.push(format!("placeholder '{{{}}}' has no variable descriptor", name));
            }
        }
        for var in &self.variables {
            if !placeholders.contains(&var.name) {
                errors.push(format!("variable '{}' does not appear in the pattern", var.name));
            }
        }

        if !self.result_template.contains("{examples}") {
            errors.push("result template is missing the {examples} slot".to_string());
        }
        if !self.failure_template.contains("{examples}") {
            errors.push("failure template is missing the {examples} slot".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_spec() -> CommandSpec {
        CommandSpec {
            name: "generate_wallet".into(),
            description: "Generates a new wallet".into(),
            explanation: "Creates a wallet bound to the user's id".into(),
            pattern: "[[GENERATE_WALLET_{user_id}]]".into(),
            variables: vec![VariableSpec {
                name: "user_id".into(),
                description: "Unique identifier of the requesting user".into(),
                example: "user123".into(),
            }],
            example_inputs: vec!["Please generate me a wallet".into()],
            result_template: "Present results.\n{examples}".into(),
            failure_template: "Explain failures.\n{examples}".into(),
            success_examples: vec![],
            failure_examples: vec![],
        }
    }

    #[test]
    fn test_valid_spec() {
        assert!(minimal_spec().validate().is_ok());
    }

    #[test]
    fn test_unbound_placeholder() {
        let mut spec = minimal_spec();
        spec.variables.clear();
        let errors = spec.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("no variable descriptor")));
    }

    #[test]
    fn test_unused_variable() {
        let mut spec = minimal_spec();
        spec.variables.push(VariableSpec {
            name: "extra".into(),
            description: "unused".into(),
            example: "x".into(),
        });
        let errors = spec.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("does not appear")));
    }

    #[test]
    fn test_missing_delimiters() {
        let mut spec = minimal_spec();
        spec.pattern = "GENERATE_WALLET_{user_id}".into();
        let errors = spec.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("[[ ]]")));
    }

    #[test]
    fn test_bad_variable_name() {
        let mut spec = minimal_spec();
        spec.pattern = "[[CMD_{1bad}]]".into();
        spec.variables = vec![VariableSpec {
            name: "1bad".into(),
            description: String::new(),
            example: String::new(),
        }];
        let errors = spec.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("invalid variable name")));
    }

    #[test]
    fn test_missing_examples_slot() {
        let mut spec = minimal_spec();
        spec.result_template = "No slot here".into();
        let errors = spec.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("{examples}")));
    }

    #[test]
    fn test_duplicate_variable() {
        let mut spec = minimal_spec();
        spec.variables.push(spec.variables[0].clone());
        let errors = spec.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("duplicate variable")));
    }
}
