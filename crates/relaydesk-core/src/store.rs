//! ConversationStore trait definition.
//!
//! The durable store is a keyed document store addressed by conversation
//! id, with full-document replace semantics on write. Implementations live
//! in relaydesk-infra (e.g., `SqliteConversationStore`). Uses native async
//! fn in traits (RPITIT, Rust 2024 edition).

use relaydesk_types::conversation::{ConversationMeta, ConversationRecord, Message};
use relaydesk_types::error::StoreError;

/// Port for conversation persistence.
///
/// The store exposes read-modify-write rather than atomic append, so it
/// makes no ordering promise across concurrent calls for the same id.
/// Callers that need "no lost appends" must serialize writes per
/// conversation id themselves (the coordinator does).
pub trait ConversationStore: Send + Sync {
    /// Fetch the full document for a conversation.
    ///
    /// Returns `Ok(None)` when no record exists yet -- absence is not an
    /// error. Fails with [`StoreError::Unavailable`] when the store cannot
    /// be reached or holds malformed data.
    fn fetch(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ConversationRecord>, StoreError>> + Send;

    /// Append a message: read the current log, push `message`, and write
    /// the full updated document back together with conversation metadata.
    ///
    /// Upsert semantics keyed by conversation id: a write for an id with no
    /// existing row creates one; a write for an existing row replaces its
    /// message log. Fails with [`StoreError::WriteFailed`]; never retries.
    fn append_message(
        &self,
        conversation_id: &str,
        message: &Message,
        meta: &ConversationMeta,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Idempotent upsert of conversation metadata with an empty message
    /// log. Used only when a join determines the conversation does not yet
    /// exist.
    fn create_conversation(
        &self,
        conversation_id: &str,
        chatbot_id: &str,
        customer_identifier: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// The ordered message log for a conversation; empty when the
    /// conversation has no record yet.
    fn read_log(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, StoreError>> + Send {
        async move {
            Ok(self
                .fetch(conversation_id)
                .await?
                .map(|record| record.message_log)
                .unwrap_or_default())
        }
    }
}
