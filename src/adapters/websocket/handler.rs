//! WebSocket upgrade handler for viewer connections.
//!
//! Handles the HTTP → WebSocket upgrade and the connection lifecycle:
//! 1. Upgrade to WebSocket
//! 2. Register the outbound half with the hub
//! 3. Answer viewer pings until the viewer goes away
//! 4. Unregister

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};

use crate::domain::hub::HubMessage;
use crate::ports::{ConsumerTransport, TransportError};

use super::{hub::EventHub, messages::ClientMessage};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub hub: Arc<EventHub>,
}

impl WebSocketState {
    pub fn new(hub: Arc<EventHub>) -> Self {
        Self { hub }
    }
}

/// Outbound half of an axum websocket.
pub struct WebSocketTransport {
    sender: SplitSink<WebSocket, Message>,
}

impl WebSocketTransport {
    pub fn new(sender: SplitSink<WebSocket, Message>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ConsumerTransport for WebSocketTransport {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        self.sender
            .send(Message::Text(frame.to_string()))
            .await
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    async fn close(&mut self) {
        if let Err(e) = self.sender.close().await {
            tracing::trace!("Close on finished websocket: {}", e);
        }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs for the lifetime of one viewer connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (sender, mut receiver) = socket.split();

    let handle = match state.hub.register(Box::new(WebSocketTransport::new(sender))) {
        Ok(handle) => handle,
        Err(e) => {
            tracing::debug!("Rejecting viewer: {}", e);
            return;
        }
    };
    let session_id = handle.id();
    tracing::info!(session_id = %session_id, "Viewer connected");

    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match ClientMessage::parse(&text) {
                Some(ClientMessage::Ping) => {
                    if !state.hub.send_to(&handle, HubMessage::pong()) {
                        break;
                    }
                }
                Some(ClientMessage::Pong) => {
                    tracing::trace!(session_id = %session_id, "Received pong");
                }
                None => {
                    tracing::debug!(session_id = %session_id, "Ignoring unsupported viewer message");
                }
            },
            Ok(Message::Binary(_)) => {
                tracing::debug!(session_id = %session_id, "Ignoring binary viewer message");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(session_id = %session_id, "Receive error: {}", e);
                break;
            }
        }
    }

    state.hub.unregister(&handle);
    tracing::info!(session_id = %session_id, "Viewer disconnected");
}

/// Create axum router for the viewer WebSocket endpoint.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .merge(websocket_router())
///     .with_state(WebSocketState::new(hub));
/// ```
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::websocket::EventHubConfig;

    #[test]
    fn websocket_state_shares_hub() {
        let hub = EventHub::new(EventHubConfig::default());
        let state = WebSocketState::new(hub.clone());

        assert!(Arc::ptr_eq(&state.hub, &hub));
    }

    #[test]
    fn websocket_router_creates_route() {
        let _router = websocket_router();
    }
}
