//! Chat history management.

pub mod history;
