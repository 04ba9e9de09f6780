//! Command Envoy - Demo Entry Point
//!
//! Interactive chat loop wiring a wallet-generation demo command to the
//! dispatcher. Requires LLM_API_KEY; see core::config for the other
//! environment variables.

use command_envoy::agent::Agent;
use command_envoy::command::{CommandRegistry, CommandSpec, ResponseExample, VariableSpec};
use command_envoy::core::config::LlmConfig;
use command_envoy::core::error::Result;
use command_envoy::llm::client::LlmClient;
use command_envoy::llm::service::GenerationParams;

use futures::StreamExt;
use std::io::{self, Write};

const AGENT_PURPOSE: &str = "I am a cryptocurrency assistant that helps users manage their \
digital assets. I can create wallets and assist with basic operations, and I aim to make \
cryptocurrency management simple and accessible for all users.";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "command_envoy=info".into()),
        )
        .init();

    tracing::info!("Command Envoy starting...");

    let config = match LlmConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Cannot start: {}", e);
            eprintln!("Set LLM_API_KEY (and optionally LLM_API_URL, LLM_MODEL) and retry.");
            return Ok(());
        }
    };
    let params = GenerationParams::from(&config);
    let client = LlmClient::from_config(&config);

    let mut agent = Agent::new(AGENT_PURPOSE, client, params);
    agent.install_registry(demo_registry()?);

    println!("\n=== COMMAND ENVOY ===");
    println!("Chat with the wallet assistant. Try: \"I need a new cryptocurrency wallet\"");
    println!("Commands:");
    println!("  quit / q   - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "q" {
            break;
        }

        match agent.dispatch(input).await {
            Ok(mut reply) => {
                while let Some(chunk) = reply.next().await {
                    match chunk {
                        Ok(text) => {
                            print!("{}", text);
                            io::stdout().flush()?;
                        }
                        Err(e) => {
                            eprintln!("\n[stream error: {}]", e);
                            break;
                        }
                    }
                }
                println!("\n");
            }
            Err(e) => eprintln!("[dispatch error: {}]", e),
        }
    }

    Ok(())
}

/// Build the demo registry with a single wallet-generation command
fn demo_registry() -> Result<CommandRegistry> {
    let mut registry = CommandRegistry::new();

    registry.register(CommandSpec {
        name: "generate_wallet".into(),
        description: "Generates a new cryptocurrency wallet".into(),
        explanation: "Creates a secure cryptocurrency wallet with public and private keys. \
                      The wallet is uniquely associated with the user's id for future reference."
            .into(),
        pattern: "[[GENERATE_WALLET_{user_id}]]".into(),
        variables: vec![VariableSpec {
            name: "user_id".into(),
            description: "Unique identifier of the user requesting the wallet".into(),
            example: "user123".into(),
        }],
        example_inputs: vec![
            "Please generate me a wallet".into(),
            "Create me a new wallet".into(),
            "I need a cryptocurrency wallet".into(),
        ],
        result_template: "You are a cryptocurrency assistant presenting wallet generation \
                          results. Never type a user id in the response.\n\
                          Here are some example responses for different results:\n\
                          {examples}\n\n\
                          Format the current result in a similar style, but with your own \
                          unique wording."
            .into(),
        failure_template: "You are a cryptocurrency assistant handling wallet generation \
                           failures. Explain what went wrong, suggest steps the user can \
                           take, and keep a security-conscious yet helpful tone.\n\
                           Here are some example responses for different errors:\n\
                           {examples}\n\n\
                           Format the current error in a similar style, but with your own \
                           unique wording."
            .into(),
        success_examples: vec![ResponseExample {
            outcome: "Generated wallet with address: ajiosdaiosdiasjd".into(),
            narrative: "Great news! I've generated a new cryptocurrency wallet for you.\n\
                        Your wallet address is: ajiosdaiosdiasjd\n\n\
                        Make sure to securely store your wallet credentials. You can now \
                        start receiving cryptocurrencies to this wallet."
                .into(),
        }],
        failure_examples: vec![ResponseExample {
            outcome: "Error: Network connection failed".into(),
            narrative: "I apologize, but I wasn't able to generate your wallet right now due \
                        to a connectivity issue. No partial wallet was created. Please check \
                        your connection and try again in a few minutes."
                .into(),
        }],
    })?;

    registry.bind_handler("generate_wallet", |vars| {
        let user_id = vars.get("user_id").map(String::as_str).unwrap_or_default();
        if user_id == "error" {
            return Err("Simulated error for testing".to_string());
        }
        Ok("Generated wallet with address: 4f7a9c2e8b1d6035".to_string())
    })?;

    Ok(registry)
}
