//! LLM provider abstractions for chatbridge.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch

pub mod box_provider;
pub mod provider;

#[cfg(any(test, feature = "testing"))]
pub mod testing;
