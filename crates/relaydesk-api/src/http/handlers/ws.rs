//! WebSocket handler for realtime chat relay connections.
//!
//! The `/ws` endpoint upgrades an HTTP connection to a WebSocket. Once
//! connected, the handler:
//!
//! - **Forwards outbound frames:** registers the connection with the
//!   [`WsTransport`](crate::ws::WsTransport) and drains its outbound
//!   channel into the socket.
//! - **Receives events:** parses incoming text frames as
//!   [`ClientEvent`] and hands them to the broadcast coordinator.
//!
//! Malformed frames are rejected at this boundary as an `error` event to
//! the sender, before any registry or store access. On close the
//! connection is unregistered from the transport (which clears its topic
//! memberships) and the coordinator drops its session records.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use relaydesk_core::transport::Transport;
use relaydesk_types::error::RelayError;
use relaydesk_types::event::{ClientEvent, ServerEvent};

use crate::state::AppState;

/// Upgrade an HTTP request to a relay WebSocket connection.
///
/// This is mounted at `/ws` in the router.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Core WebSocket connection handler.
///
/// Uses `tokio::select!` to multiplex between outbound frames from the
/// transport and inbound messages from the client. Inbound events are
/// processed one at a time per connection; outbound frames buffer in the
/// transport channel meanwhile.
async fn handle_ws_connection(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::now_v7();
    let mut outbound = state.transport.register(connection_id);
    let (mut ws_sender, mut ws_receiver) = socket.split();
    info!(connection_id = %connection_id, "connection opened");

    loop {
        tokio::select! {
            // --- Branch 1: Forward transport frames to the client ---
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                            // Client disconnected
                            break;
                        }
                    }
                    // Transport dropped this connection (re-registration)
                    None => break,
                }
            }

            // --- Branch 2: Process events from the client ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        process_frame(connection_id, &text, &state).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Client disconnected
                        break;
                    }
                    Some(Err(err)) => {
                        debug!(connection_id = %connection_id, "WebSocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.transport.unregister(&connection_id);
    state.coordinator.handle_disconnect(connection_id);
    debug!(connection_id = %connection_id, "connection closed");
}

/// Parse one inbound frame and dispatch it to the coordinator.
async fn process_frame(connection_id: Uuid, text: &str, state: &AppState) {
    let event: ClientEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(err) => {
            let reason = RelayError::InvalidPayload(err.to_string()).to_string();
            warn!(connection_id = %connection_id, raw = %text, "rejecting malformed frame: {err}");
            state
                .transport
                .send(connection_id, &ServerEvent::Error { reason })
                .await;
            return;
        }
    };

    state.coordinator.handle_event(connection_id, event).await;
}
