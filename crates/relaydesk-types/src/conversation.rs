//! Conversation, message, and summary types for RelayDesk.
//!
//! A conversation is a caller-identified thread of messages between one
//! customer and zero-or-more agents, keyed by an opaque string id. The
//! durable store holds the full [`ConversationRecord`]; the in-process
//! index holds only [`ConversationSummary`] entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Which side of the conversation authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Customer,
    Agent,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Customer => write!(f, "customer"),
            Sender::Agent => write!(f, "agent"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "customer" => Ok(Sender::Customer),
            "agent" => Ok(Sender::Agent),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// A single chat message.
///
/// Immutable once created. The timestamp is always assigned server-side;
/// client-supplied timestamps are never trusted for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub conversation_id: String,
}

/// Dashboard-facing summary of one conversation.
///
/// Lives only in the in-process conversation index: created on first
/// customer-join or on load of an existing conversation, mutated on every
/// accepted message, removed by the eviction sweeper or process restart.
/// It is a cache, not the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub chatbot_id: String,
    pub customer_identifier: String,
    pub last_activity: DateTime<Utc>,
    pub last_message: Option<Message>,
}

/// The durable document for one conversation, keyed by `conversation_id`.
///
/// The message log is append-only from the relay's perspective: the relay
/// never deletes or reorders history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub chatbot_id: String,
    pub customer_identifier: String,
    pub message_log: Vec<Message>,
    pub created_at: DateTime<Utc>,
}

/// Conversation metadata written back alongside every message append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationMeta {
    pub chatbot_id: String,
    pub customer_identifier: String,
}
