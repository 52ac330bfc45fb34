//! WebSocket handler pushing raw reply fragments to live listeners.
//!
//! The `/ws` endpoint upgrades an HTTP connection and registers the socket
//! with the session's listener registry. Every fragment the model streams
//! is forwarded as a plain text frame. Frames sent by the client are read
//! and discarded. The listener is unregistered when the client closes, when
//! a send fails, or when the registry drops it for falling behind.

use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, Stream, StreamExt};

use chatbridge_core::relay::listeners::{ListenerHandle, ListenerRegistry};

use crate::state::AppState;

/// Upgrade an HTTP request to a WebSocket connection.
///
/// This is mounted at `/ws` in the router.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let registry = Arc::clone(state.session.listeners());
    let handle = registry.register();
    tracing::debug!(listener = %handle.id, active = registry.len(), "WebSocket listener connected");

    let (ws_sender, ws_receiver) = socket.split();
    forward_fragments(&registry, handle, ws_sender, ws_receiver).await;
}

/// Pump fragments from a listener queue into `sink` until either side ends.
///
/// Uses `tokio::select!` so a single task both forwards fragments and
/// notices the client going away.
pub async fn forward_fragments<S, R, E>(
    registry: &ListenerRegistry,
    handle: ListenerHandle,
    mut sink: S,
    mut incoming: R,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
{
    let ListenerHandle { id, mut receiver } = handle;

    loop {
        tokio::select! {
            fragment = receiver.recv() => {
                match fragment {
                    Some(text) => {
                        if sink.send(Message::Text(text.into())).await.is_err() {
                            tracing::debug!(listener = %id, "WebSocket send failed");
                            break;
                        }
                    }
                    // Registry dropped this listener
                    None => break,
                }
            }

            msg = incoming.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(listener = %id, "WebSocket receive error: {err}");
                        break;
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    registry.unregister(&id);
    tracing::debug!(listener = %id, "WebSocket listener closed");
}
