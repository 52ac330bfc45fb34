//! Infrastructure adapters for chatbridge.
//!
//! Implements the `LlmProvider` port from `chatbridge-core` against any
//! OpenAI-compatible chat completions service, and loads `BridgeConfig`
//! from TOML files and the environment.

pub mod config;
pub mod llm;
