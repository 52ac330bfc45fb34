//! Shared domain types for chatbridge.
//!
//! This crate contains the types passed between the processing path and the
//! inspection surface: chat turns, language tags, prompt/response records,
//! the memory snapshot, LLM request/stream shapes, configuration, and errors.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod record;
