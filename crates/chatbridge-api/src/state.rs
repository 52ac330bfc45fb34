//! Application state shared by the chat loop and the HTTP server.

use std::sync::Arc;

use secrecy::SecretString;

use chatbridge_core::llm::box_provider::BoxLlmProvider;
use chatbridge_core::session::ChatSession;
use chatbridge_infra::llm::openai_compat::config::from_bridge_config;
use chatbridge_infra::llm::openai_compat::OpenAiCompatibleProvider;
use chatbridge_types::config::BridgeConfig;

/// Shared application state.
///
/// The foreground chat loop submits prompts through `session`; the server
/// task only reads its logs and memory and registers live listeners.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ChatSession>,
}

impl AppState {
    pub fn new(session: ChatSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }

    /// Wire the remote provider and the chat session from configuration.
    pub fn init(config: &BridgeConfig, api_key: SecretString) -> anyhow::Result<Self> {
        let provider = OpenAiCompatibleProvider::new(from_bridge_config(config, api_key))?;
        let session = ChatSession::new(config, BoxLlmProvider::new(provider))?;
        Ok(Self::new(session))
    }
}
