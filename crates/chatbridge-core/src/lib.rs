//! Business logic for chatbridge.
//!
//! This crate owns the conversation state machine: the chat history window,
//! the compacting memory, the prompt/response log, and the streaming relay.
//! It talks to the remote model only through the [`llm::provider::LlmProvider`]
//! port and never depends on `chatbridge-infra` or any network crate.

pub mod chat;
pub mod llm;
pub mod memory;
pub mod record;
pub mod relay;
pub mod session;
