//! Wire events exchanged between connections and the broadcast coordinator.
//!
//! Inbound frames deserialize into [`ClientEvent`], one tagged variant per
//! event name, so malformed payloads are rejected at the transport boundary
//! before any registry or store access. Outbound frames serialize from
//! [`ServerEvent`]. All variants are Clone + Send + Sync for use with
//! per-connection channels.

use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationSummary, Message, Sender};

/// Events a connected client may send to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// A customer attaches to (or creates) a conversation.
    #[serde(rename = "customer:join", rename_all = "camelCase")]
    CustomerJoin {
        conversation_id: String,
        chatbot_id: String,
        user_id: String,
        customer_email: String,
    },

    /// A support agent attaches to an existing conversation.
    #[serde(rename = "agent:join", rename_all = "camelCase")]
    AgentJoin { conversation_id: String },

    /// A participant sends a message into a conversation.
    ///
    /// Any client-supplied timestamp is ignored; the server clock is
    /// authoritative for ordering.
    #[serde(rename = "message:send", rename_all = "camelCase")]
    SendMessage {
        conversation_id: String,
        chatbot_id: String,
        user_id: String,
        text: String,
        sender: Sender,
    },
}

impl ClientEvent {
    /// The conversation id this event targets.
    pub fn conversation_id(&self) -> &str {
        match self {
            ClientEvent::CustomerJoin {
                conversation_id, ..
            }
            | ClientEvent::AgentJoin { conversation_id }
            | ClientEvent::SendMessage {
                conversation_id, ..
            } => conversation_id,
        }
    }
}

/// Events the relay emits to connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Join acknowledgement, sent to the joining connection only.
    #[serde(rename = "chat:joined", rename_all = "camelCase")]
    ChatJoined {
        conversation_id: String,
        customer_email: String,
    },

    /// Full index snapshot, broadcast to all dashboard subscribers.
    #[serde(rename = "chat:updated")]
    ChatUpdated { summaries: Vec<ConversationSummary> },

    /// A durably stored message, fanned out to the conversation topic.
    #[serde(rename = "message:received")]
    MessageReceived(Message),

    /// Handler failure, sent to the originating connection only.
    #[serde(rename = "error")]
    Error { reason: String },
}

/// The broadcast topic for one conversation id.
///
/// All connections subscribed to it receive messages sent within that
/// conversation.
pub fn conversation_topic(conversation_id: &str) -> String {
    format!("conversation:{conversation_id}")
}
