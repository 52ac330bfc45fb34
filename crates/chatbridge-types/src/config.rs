//! Configuration types for chatbridge.
//!
//! `BridgeConfig` represents the top-level `chatbridge.toml`. Every field has
//! a default, so an empty file (or no file at all) yields a usable config.

use serde::{Deserialize, Serialize};

use crate::chat::Language;
use crate::error::ConfigError;
use crate::llm::MessageRole;

/// Top-level configuration for a bridge session and its servers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Model identifier sent with every completion request.
    pub model: String,
    /// Base URL of the OpenAI-compatible completion service.
    pub base_url: String,
    /// Stream replies fragment by fragment instead of waiting for the full text.
    pub stream: bool,
    /// Role used for the user's turns.
    pub user_role: String,
    /// Role of the permanent first turn. Empty disables the initial turn.
    pub init_chat_role: String,
    /// Content of the permanent first turn.
    pub init_chat_prompt: String,
    /// Number of recent turns kept in the chat history window.
    pub chat_size: usize,
    /// Bind address for the inspection API and live channel.
    pub host: String,
    pub api_port: u16,
    /// Upper bound on any single remote model call.
    pub request_timeout_secs: u64,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Send one request at startup to verify the service is reachable.
    pub warmup: bool,
    /// Queue depth per live listener before it is considered stalled.
    pub listener_buffer: usize,
    /// Language tag applied to prompts that carry none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_language: Option<String>,
    pub memory: MemoryConfig,
}

/// Memory compaction thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Compact once the raw transcript grows past this many characters.
    pub transcript_threshold: usize,
    /// Condense the summary itself once it grows past this many characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_threshold: Option<usize>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            transcript_threshold: 1000,
            summary_threshold: None,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".to_string(),
            base_url: "https://api.deepseek.com/v1".to_string(),
            stream: false,
            user_role: "user".to_string(),
            init_chat_role: "system".to_string(),
            init_chat_prompt: "You are a helpful AI assistant.".to_string(),
            chat_size: 1,
            host: "0.0.0.0".to_string(),
            api_port: 5000,
            request_timeout_secs: 60,
            max_tokens: 1024,
            temperature: None,
            warmup: true,
            listener_buffer: 256,
            default_language: None,
            memory: MemoryConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Parsed role for user turns.
    pub fn user_role(&self) -> Result<MessageRole, ConfigError> {
        self.user_role
            .parse()
            .map_err(|_| ConfigError::UnknownRole(self.user_role.clone()))
    }

    /// The permanent initial turn, if one is configured.
    ///
    /// Fails when a role is set without any instruction text.
    pub fn init_turn(&self) -> Result<Option<crate::chat::ChatTurn>, ConfigError> {
        if self.init_chat_role.trim().is_empty() {
            return Ok(None);
        }
        let role: MessageRole = self
            .init_chat_role
            .parse()
            .map_err(|_| ConfigError::UnknownRole(self.init_chat_role.clone()))?;
        if self.init_chat_prompt.trim().is_empty() {
            return Err(ConfigError::MissingInitialPrompt);
        }
        Ok(Some(crate::chat::ChatTurn::new(
            role,
            self.init_chat_prompt.clone(),
        )))
    }

    /// Parsed default language, if any.
    pub fn default_language(&self) -> Result<Option<Language>, ConfigError> {
        self.default_language
            .as_deref()
            .map(str::parse)
            .transpose()
    }

    /// Check every field that can make the session unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.user_role()?;
        self.init_turn()?;
        self.default_language()?;
        if self.chat_size == 0 {
            return Err(ConfigError::ZeroChatSize);
        }
        Ok(())
    }
}
