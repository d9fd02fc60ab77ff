use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColonyError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("LLM call timed out after {0} ms")]
    Timeout(u64),

    #[error("Malformed decision: {0}")]
    MalformedDecision(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, ColonyError>;
