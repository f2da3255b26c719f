//! Broadcast coordinator: routes inbound events to the registry, index,
//! and store, and fans results out to the correct subscriber groups.
//!
//! Each connection conceptually moves Unjoined -> Joined(role,
//! conversation) -> Closed. There is no reconnection logic; a fresh
//! connection always starts Unjoined.
//!
//! Failure discipline: a handler error is logged, surfaced to the
//! originating connection as an `error` event, and the triggering event is
//! otherwise dropped. A failed message send must not update the index nor
//! broadcast the message -- nothing is shown that was not durably saved.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use relaydesk_types::conversation::{ConversationMeta, ConversationSummary, Message, Sender};
use relaydesk_types::error::RelayError;
use relaydesk_types::event::{conversation_topic, ClientEvent, ServerEvent};
use relaydesk_types::session::{AgentSession, CustomerSession};

use crate::relay::index::ConversationIndex;
use crate::relay::registry::SessionRegistry;
use crate::store::ConversationStore;
use crate::transport::Transport;

/// Coordinates connection events against the store, registry, and index.
///
/// Generic over the store and transport ports so tests can inject fakes.
/// The registry and index are owned here with single-writer discipline per
/// key rather than living as ambient global state.
pub struct Coordinator<S, T> {
    store: S,
    transport: Arc<T>,
    registry: SessionRegistry,
    index: Arc<ConversationIndex>,
    /// Per-conversation write serialization for the store's
    /// read-modify-write append. Two concurrent sends to the same
    /// conversation would otherwise both read the log before either
    /// writes, losing one append.
    // TODO: drop lock entries for conversations evicted from the index.
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S, T> Coordinator<S, T>
where
    S: ConversationStore,
    T: Transport,
{
    /// Create a coordinator over the given ports.
    ///
    /// The index is shared (the eviction sweeper holds the other handle);
    /// the registry is owned exclusively.
    pub fn new(store: S, transport: Arc<T>, index: Arc<ConversationIndex>) -> Self {
        Self {
            store,
            transport,
            registry: SessionRegistry::new(),
            index,
            write_locks: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn index(&self) -> &ConversationIndex {
        &self.index
    }

    /// Dispatch one inbound event for a connection.
    ///
    /// Errors never escape: they are logged and surfaced to the
    /// originating connection only, leaving other connections and the
    /// sweeper untouched.
    pub async fn handle_event(&self, connection_id: Uuid, event: ClientEvent) {
        let result = match event {
            ClientEvent::CustomerJoin {
                conversation_id,
                chatbot_id,
                user_id,
                customer_email,
            } => {
                self.customer_join(
                    connection_id,
                    conversation_id,
                    chatbot_id,
                    user_id,
                    customer_email,
                )
                .await
            }
            ClientEvent::AgentJoin { conversation_id } => {
                self.agent_join(connection_id, conversation_id).await
            }
            ClientEvent::SendMessage {
                conversation_id,
                chatbot_id,
                user_id,
                text,
                sender,
            } => {
                self.send_message(
                    connection_id,
                    conversation_id,
                    chatbot_id,
                    user_id,
                    text,
                    sender,
                )
                .await
            }
        };

        if let Err(err) = result {
            warn!(connection_id = %connection_id, error = %err, "event handler failed");
            self.transport
                .send(
                    connection_id,
                    &ServerEvent::Error {
                        reason: err.to_string(),
                    },
                )
                .await;
        }
    }

    /// Remove the connection's session records.
    ///
    /// No broadcast: topic membership is cleaned up by the transport.
    pub fn handle_disconnect(&self, connection_id: Uuid) {
        self.registry.remove(&connection_id);
        debug!(connection_id = %connection_id, "connection sessions removed");
    }

    async fn customer_join(
        &self,
        connection_id: Uuid,
        conversation_id: String,
        chatbot_id: String,
        user_id: String,
        customer_email: String,
    ) -> Result<(), RelayError> {
        validate_conversation_id(&conversation_id)?;

        match self.store.fetch(&conversation_id).await? {
            None => {
                // First sight of this conversation: create the durable
                // record, then surface a fresh summary to dashboards.
                self.store
                    .create_conversation(&conversation_id, &chatbot_id, &user_id)
                    .await?;
                self.index.upsert(ConversationSummary {
                    conversation_id: conversation_id.clone(),
                    chatbot_id: chatbot_id.clone(),
                    customer_identifier: user_id.clone(),
                    last_activity: Utc::now(),
                    last_message: None,
                });
                debug!(conversation_id = %conversation_id, "conversation created");
            }
            Some(record) => {
                // Known conversation: (re)load its summary so dashboards
                // see it even after an eviction or restart.
                self.index.upsert(ConversationSummary {
                    conversation_id: record.conversation_id,
                    chatbot_id: record.chatbot_id,
                    customer_identifier: record.customer_identifier,
                    last_activity: Utc::now(),
                    last_message: record.message_log.into_iter().next_back(),
                });
            }
        }

        self.registry.register_customer(CustomerSession {
            connection_id,
            conversation_id: conversation_id.clone(),
            chatbot_id,
            user_id,
            customer_email: customer_email.clone(),
        });
        self.transport
            .subscribe(connection_id, &conversation_topic(&conversation_id))
            .await;

        self.broadcast_index().await;
        self.transport
            .send(
                connection_id,
                &ServerEvent::ChatJoined {
                    conversation_id,
                    customer_email,
                },
            )
            .await;
        Ok(())
    }

    async fn agent_join(
        &self,
        connection_id: Uuid,
        conversation_id: String,
    ) -> Result<(), RelayError> {
        validate_conversation_id(&conversation_id)?;

        // Validates the store is reachable before the agent is attached.
        // Agents never create conversations, so the index is not touched.
        self.store.fetch(&conversation_id).await?;

        self.registry.register_agent(AgentSession {
            connection_id,
            conversation_id: conversation_id.clone(),
        });
        self.transport
            .subscribe(connection_id, &conversation_topic(&conversation_id))
            .await;
        debug!(connection_id = %connection_id, conversation_id = %conversation_id, "agent joined");
        Ok(())
    }

    async fn send_message(
        &self,
        _connection_id: Uuid,
        conversation_id: String,
        chatbot_id: String,
        user_id: String,
        text: String,
        sender: Sender,
    ) -> Result<(), RelayError> {
        validate_conversation_id(&conversation_id)?;

        // Server clock is authoritative for ordering.
        let message = Message {
            text,
            sender,
            timestamp: Utc::now(),
            conversation_id: conversation_id.clone(),
        };
        let meta = ConversationMeta {
            chatbot_id,
            customer_identifier: user_id,
        };

        {
            // Hold this conversation's write lock across the store's
            // read-modify-write so concurrent sends cannot lose appends.
            // Sends to distinct conversations proceed concurrently.
            let lock = self.write_lock(&conversation_id);
            let _guard = lock.lock().await;
            self.store
                .append_message(&conversation_id, &message, &meta)
                .await?;
        }

        self.transport
            .publish(
                &conversation_topic(&conversation_id),
                &ServerEvent::MessageReceived(message.clone()),
            )
            .await;
        self.index.touch(&conversation_id, message);
        self.broadcast_index().await;
        Ok(())
    }

    async fn broadcast_index(&self) {
        self.transport
            .publish_to_all(&ServerEvent::ChatUpdated {
                summaries: self.index.snapshot(),
            })
            .await;
    }

    fn write_lock(&self, conversation_id: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(conversation_id.to_string())
            .or_default()
            .clone()
    }
}

fn validate_conversation_id(conversation_id: &str) -> Result<(), RelayError> {
    if conversation_id.trim().is_empty() {
        return Err(RelayError::InvalidPayload(
            "conversationId must not be empty".to_string(),
        ));
    }
    Ok(())
}
