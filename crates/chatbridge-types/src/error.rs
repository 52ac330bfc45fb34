use thiserror::Error;

use crate::llm::LlmError;

/// Setup-time errors. All of these are fatal before any request is served.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("an initial prompt must be specified when init_chat_role is set")]
    MissingInitialPrompt,

    #[error("chat_size must be at least 1")]
    ZeroChatSize,

    #[error("invalid role '{0}'")]
    UnknownRole(String),

    #[error("unsupported language tag '{0}'")]
    UnknownLanguage(String),

    #[error("no API key configured (set CHATBRIDGE_API_KEY or OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("invalid config file: {0}")]
    Parse(String),
}

/// Errors surfaced by the prompt processing path.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The remote model call (or a summarization call) failed.
    #[error("remote model call failed: {0}")]
    Llm(#[from] LlmError),

    /// The session or the prompt is misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BridgeError {
    /// Whether resubmitting the same prompt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Llm(e) => e.is_retryable(),
            BridgeError::Config(_) => false,
        }
    }
}
