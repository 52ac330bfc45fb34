//! Configuration for OpenAI-compatible providers.
//!
//! Every service speaking the OpenAI chat completions protocol is reached
//! through the same [`OpenAiCompatConfig`], built from the bridge settings.

use std::time::Duration;

use secrecy::SecretString;

use chatbridge_types::config::BridgeConfig;

/// Configuration for an OpenAI-compatible LLM provider.
///
/// Used to construct an [`super::OpenAiCompatibleProvider`].
pub struct OpenAiCompatConfig {
    /// Human-readable provider name (e.g., "openai", "deepseek").
    pub provider_name: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    pub base_url: String,
    /// API key for authentication.
    pub api_key: SecretString,
    /// Model used when a request leaves the model empty.
    pub model: String,
    /// Upper bound on every HTTP request, streamed bodies included.
    pub timeout: Duration,
}

/// Build a provider configuration from the bridge configuration.
pub fn from_bridge_config(config: &BridgeConfig, api_key: SecretString) -> OpenAiCompatConfig {
    OpenAiCompatConfig {
        provider_name: provider_name_for(&config.base_url).to_string(),
        base_url: config.base_url.trim_end_matches('/').to_string(),
        api_key,
        model: config.model.clone(),
        timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
    }
}

/// Guess a readable provider name from the service URL.
pub fn provider_name_for(base_url: &str) -> &'static str {
    let url = base_url.to_lowercase();
    if url.contains("deepseek.com") {
        "deepseek"
    } else if url.contains("openai.com") {
        "openai"
    } else if url.contains("mistral.ai") {
        "mistral"
    } else if url.contains("localhost") || url.contains("127.0.0.1") {
        "local"
    } else {
        "openai_compatible"
    }
}
