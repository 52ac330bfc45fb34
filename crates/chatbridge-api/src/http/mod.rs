//! Read-only inspection API and live fragment WebSocket.

pub mod error;
pub mod handlers;
pub mod router;
