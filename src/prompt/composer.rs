//! Prompt construction
//!
//! Deterministic string rendering for both phases: the detection-phase
//! system instruction (agent purpose plus the full command catalog) and the
//! per-command presentation prompts (template with literal example outcomes
//! interpolated). No side effects beyond reading registry state; rendering
//! never fails for descriptors that passed registration.

use crate::command::registry::CommandRegistry;
use crate::command::spec::ResponseExample;

/// Renders system-level instruction text for the agent
///
/// Holds the agent's purpose so every turn carries a consistent voice.
pub struct PromptComposer {
    agent_purpose: String,
}

impl PromptComposer {
    pub fn new(agent_purpose: impl Into<String>) -> Self {
        Self {
            agent_purpose: agent_purpose.into(),
        }
    }

    pub fn agent_purpose(&self) -> &str {
        &self.agent_purpose
    }

    /// Render the detection-phase system instruction
    ///
    /// Contains the agent purpose, the emit-exactly directive, and every
    /// registered command in registration order with its description,
    /// explanation, pattern, variables, and example inputs.
    pub fn system_instruction(&self, registry: &CommandRegistry) -> String {
        let mut prompt = format!(
            "You are an AI assistant with the following purpose:\n{}\n\n\
             When a user's request matches one of the available commands:\n\
             1. DO NOT explain what you are about to do\n\
             2. DO NOT add any additional text or newlines\n\
             3. ONLY respond with the exact command pattern, replacing variables with their values\n\
             4. The response must be EXACTLY in the format shown in the Pattern field\n\
             5. Variable names are case-sensitive, use them exactly as shown\n\n\
             If the request does not match any command, respond naturally without using any \
             command patterns.\n\nAvailable commands:\n",
            self.agent_purpose
        );

        for spec in registry.iter() {
            prompt.push_str(&format!("\n- {}:", spec.name));
            prompt.push_str(&format!("\n  Description: {}", spec.description));
            prompt.push_str(&format!("\n  Explanation: {}", spec.explanation));
            prompt.push_str(&format!("\n  Pattern: {}", spec.pattern));
            prompt.push_str("\n  Variables:");
            for var in &spec.variables {
                prompt.push_str(&format!(
                    "\n    - {}: {} (Example: {})",
                    var.name, var.description, var.example
                ));
            }
            prompt.push_str("\n  Example inputs:");
            for example in &spec.example_inputs {
                prompt.push_str(&format!("\n    - {}", example));
            }
            prompt.push('\n');
        }

        prompt.push_str(
            "\nRemember: when using a command, output ONLY the command pattern with no \
             additional text or newlines.",
        );
        prompt
    }
}

/// Interpolate literal example outcomes into a presentation template
///
/// Substitutes the template's `{examples}` slot with one block per example,
/// "For <label>: <outcome>" followed by the narrative, blocks separated by a
/// blank line. `label` is "result" for success templates and "error" for
/// failure templates. Called once per template at registration.
pub fn render_examples(template: &str, examples: &[ResponseExample], label: &str) -> String {
    let blocks = examples
        .iter()
        .map(|example| {
            format!(
                "For {}: {}\nResponse:\n{}",
                label, example.outcome, example.narrative
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    template.replace("{examples}", &blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::spec::{CommandSpec, VariableSpec};

    fn demo_registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandSpec {
                name: "generate_wallet".into(),
                description: "Generates a new cryptocurrency wallet".into(),
                explanation: "Creates a wallet bound to the user's id".into(),
                pattern: "[[GENERATE_WALLET_{user_id}]]".into(),
                variables: vec![VariableSpec {
                    name: "user_id".into(),
                    description: "Unique identifier of the requesting user".into(),
                    example: "user123".into(),
                }],
                example_inputs: vec![
                    "Please generate me a wallet".into(),
                    "I need a cryptocurrency wallet".into(),
                ],
                result_template: "Present results.\n{examples}".into(),
                failure_template: "Explain failures.\n{examples}".into(),
                success_examples: vec![],
                failure_examples: vec![],
            })
            .unwrap();
        registry
    }

    #[test]
    fn test_system_instruction_contents() {
        let composer = PromptComposer::new("I am a cryptocurrency assistant.");
        let instruction = composer.system_instruction(&demo_registry());

        assert!(instruction.contains("I am a cryptocurrency assistant."));
        assert!(instruction.contains("generate_wallet"));
        assert!(instruction.contains("[[GENERATE_WALLET_{user_id}]]"));
        assert!(instruction.contains("user_id: Unique identifier"));
        assert!(instruction.contains("Example: user123"));
        assert!(instruction.contains("Please generate me a wallet"));
        assert!(instruction.contains("ONLY respond with the exact command pattern"));
    }

    #[test]
    fn test_commands_listed_in_registration_order() {
        let composer = PromptComposer::new("purpose");
        let mut registry = demo_registry();
        registry
            .register(CommandSpec {
                name: "check_balance".into(),
                description: "Checks a wallet balance".into(),
                explanation: "Reads the balance for a wallet address".into(),
                pattern: "[[CHECK_BALANCE_{address}]]".into(),
                variables: vec![VariableSpec {
                    name: "address".into(),
                    description: "Wallet address".into(),
                    example: "0xabc".into(),
                }],
                example_inputs: vec!["What is my balance?".into()],
                result_template: "{examples}".into(),
                failure_template: "{examples}".into(),
                success_examples: vec![],
                failure_examples: vec![],
            })
            .unwrap();

        let instruction = composer.system_instruction(&registry);
        let first = instruction.find("generate_wallet").unwrap();
        let second = instruction.find("check_balance").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_render_examples() {
        let examples = vec![
            ResponseExample {
                outcome: "Generated wallet with address: abc".into(),
                narrative: "Great news! Your wallet is ready.".into(),
            },
            ResponseExample {
                outcome: "Generated wallet with address: xyz".into(),
                narrative: "All set, your wallet address is xyz.".into(),
            },
        ];
        let rendered = render_examples("Header.\n{examples}\nFooter.", &examples, "result");

        assert!(rendered.starts_with("Header.\n"));
        assert!(rendered.ends_with("\nFooter."));
        assert!(rendered.contains("For result: Generated wallet with address: abc"));
        assert!(rendered.contains("Response:\nGreat news! Your wallet is ready."));
        // Blocks are separated by a blank line
        assert!(rendered.contains("ready.\n\nFor result: Generated wallet with address: xyz"));
        assert!(!rendered.contains("{examples}"));
    }

    #[test]
    fn test_render_examples_error_label() {
        let examples = vec![ResponseExample {
            outcome: "Error: network down".into(),
            narrative: "Something went wrong.".into(),
        }];
        let rendered = render_examples("{examples}", &examples, "error");
        assert!(rendered.starts_with("For error: Error: network down"));
    }

    #[test]
    fn test_render_examples_empty() {
        let rendered = render_examples("A{examples}B", &[], "result");
        assert_eq!(rendered, "AB");
    }
}
