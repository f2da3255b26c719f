//! Transport trait definition.
//!
//! The transport accepts duplex connections, assigns connection ids, and
//! exposes the publish/subscribe primitives the coordinator fans out
//! through. The production implementation (`WsTransport` in relaydesk-api)
//! is backed by axum WebSockets; tests inject recording fakes.

use relaydesk_types::event::ServerEvent;
use uuid::Uuid;

/// Port for event delivery to live connections.
///
/// Delivery is best-effort within the live process: publishing to a topic
/// with no subscribers is a no-op, and implementations may drop frames for
/// connections that cannot keep up rather than block the caller.
pub trait Transport: Send + Sync {
    /// Add a connection to a topic's broadcast group.
    fn subscribe(
        &self,
        connection_id: Uuid,
        topic: &str,
    ) -> impl std::future::Future<Output = ()> + Send;

    /// Deliver an event to every member of a topic.
    fn publish(
        &self,
        topic: &str,
        event: &ServerEvent,
    ) -> impl std::future::Future<Output = ()> + Send;

    /// Deliver an event to every connection (dashboard broadcast).
    fn publish_to_all(&self, event: &ServerEvent) -> impl std::future::Future<Output = ()> + Send;

    /// Deliver an event to a single connection (join acks and errors).
    fn send(
        &self,
        connection_id: Uuid,
        event: &ServerEvent,
    ) -> impl std::future::Future<Output = ()> + Send;
}
