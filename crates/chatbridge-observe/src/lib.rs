//! Observability setup shared by chatbridge binaries.

pub mod tracing_setup;
