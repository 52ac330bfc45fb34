//! Append-only prompt and response logs.

pub mod log;
