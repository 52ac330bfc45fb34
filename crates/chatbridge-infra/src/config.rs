//! Configuration loader for chatbridge.
//!
//! Reads a TOML file into [`BridgeConfig`], then layers environment
//! overrides on top. The API key never lives in the file; it is resolved
//! from the environment into a [`SecretString`].

use std::path::Path;

use secrecy::SecretString;

use chatbridge_types::config::BridgeConfig;
use chatbridge_types::error::ConfigError;

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "chatbridge.toml";

pub const API_KEY_ENV: &str = "CHATBRIDGE_API_KEY";
pub const FALLBACK_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "CHATBRIDGE_BASE_URL";
pub const MODEL_ENV: &str = "CHATBRIDGE_MODEL";

/// Load configuration from `path`, or `./chatbridge.toml` when `None`.
///
/// - If the file does not exist, returns [`BridgeConfig::default()`].
/// - If the file exists but fails to parse, returns [`ConfigError::Parse`].
/// - Other read failures return [`ConfigError::Io`].
pub async fn load_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    let config_path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return Ok(BridgeConfig::default());
        }
        Err(err) => {
            return Err(ConfigError::Io(format!(
                "failed to read {}: {err}",
                config_path.display()
            )));
        }
    };

    let config = toml::from_str::<BridgeConfig>(&content)
        .map_err(|err| ConfigError::Parse(format!("{}: {err}", config_path.display())))?;

    tracing::info!("Loaded configuration from {}", config_path.display());
    Ok(config)
}

/// Apply `CHATBRIDGE_BASE_URL` / `CHATBRIDGE_MODEL` overrides.
///
/// `lookup` abstracts the environment so callers (and tests) can supply
/// their own source; pass `|k| std::env::var(k).ok()` in production.
pub fn apply_env_overrides<F>(mut config: BridgeConfig, lookup: F) -> BridgeConfig
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.base_url = base_url;
    }
    if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
        config.model = model;
    }
    config
}

/// Resolve the API key: `CHATBRIDGE_API_KEY`, then `OPENAI_API_KEY`.
pub fn resolve_api_key<F>(lookup: F) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    [API_KEY_ENV, FALLBACK_API_KEY_ENV]
        .into_iter()
        .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
        .ok_or(ConfigError::MissingApiKey)
}
