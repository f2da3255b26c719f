//! WebSocket-backed transport implementation.
//!
//! `WsTransport` implements the `Transport` port from `relaydesk-core`
//! over per-connection outbound channels and an in-memory topic table.
//! The WebSocket handler (`http::handlers::ws`) registers a connection,
//! drains its outbound channel into the socket, and unregisters on close.
//!
//! Delivery is best-effort: a connection whose outbound buffer is full has
//! the frame dropped with a warning rather than blocking the publisher.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use relaydesk_core::transport::Transport;
use relaydesk_types::event::ServerEvent;

/// Connection table plus topic membership for fan-out.
pub struct WsTransport {
    /// Outbound frame channel per live connection.
    connections: DashMap<Uuid, mpsc::Sender<String>>,
    /// Topic name -> member connection ids.
    topics: DashMap<String, HashSet<Uuid>>,
    /// Capacity of each connection's outbound channel.
    buffer: usize,
}

impl WsTransport {
    pub fn new(buffer: usize) -> Self {
        Self {
            connections: DashMap::new(),
            topics: DashMap::new(),
            buffer,
        }
    }

    /// Register a new connection and hand back the receiving half of its
    /// outbound channel. Overwrites (and thereby closes) any previous
    /// registration under the same id.
    pub fn register(&self, connection_id: Uuid) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.connections.insert(connection_id, tx);
        rx
    }

    /// Drop a connection from the table and from every topic.
    pub fn unregister(&self, connection_id: &Uuid) {
        self.connections.remove(connection_id);
        self.topics.retain(|_, members| {
            members.remove(connection_id);
            !members.is_empty()
        });
        debug!(connection_id = %connection_id, "connection unregistered");
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    fn deliver(&self, connection_id: Uuid, frame: &str) {
        if let Some(tx) = self.connections.get(&connection_id) {
            if tx.try_send(frame.to_string()).is_err() {
                warn!(connection_id = %connection_id, "dropping frame for slow or closing connection");
            }
        }
    }

    fn encode(event: &ServerEvent) -> Option<String> {
        match serde_json::to_string(event) {
            Ok(frame) => Some(frame),
            Err(err) => {
                warn!(error = %err, "failed to serialize server event");
                None
            }
        }
    }
}

impl Transport for WsTransport {
    async fn subscribe(&self, connection_id: Uuid, topic: &str) {
        self.topics
            .entry(topic.to_string())
            .or_default()
            .insert(connection_id);
    }

    async fn publish(&self, topic: &str, event: &ServerEvent) {
        let Some(frame) = Self::encode(event) else {
            return;
        };
        if let Some(members) = self.topics.get(topic) {
            for connection_id in members.iter() {
                self.deliver(*connection_id, &frame);
            }
        }
    }

    async fn publish_to_all(&self, event: &ServerEvent) {
        let Some(frame) = Self::encode(event) else {
            return;
        };
        for entry in self.connections.iter() {
            self.deliver(*entry.key(), &frame);
        }
    }

    async fn send(&self, connection_id: Uuid, event: &ServerEvent) {
        if let Some(frame) = Self::encode(event) {
            self.deliver(connection_id, &frame);
        }
    }
}
