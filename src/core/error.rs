use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnvoyError {
    /// Dispatch was invoked before a command registry was installed.
    /// Raised before any network interaction takes place.
    #[error("Command registry not initialized")]
    NotInitialized,

    /// A command definition failed registration-time validation.
    #[error("Invalid command definition: {0}")]
    InvalidCommand(String),

    #[error("Duplicate command name: {0}")]
    DuplicateCommand(String),

    /// The language-model service call failed (network, auth, quota,
    /// malformed stream). Fatal for the turn; never converted into a
    /// failure-branch prompt.
    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EnvoyError>;
