//! Session records binding live connections to conversations.
//!
//! Sessions are ephemeral: created on join, deleted on disconnect, and
//! lost on process restart by design (conversation content is always
//! reconstructible from the durable store).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A customer connection attached to a conversation.
///
/// At most one exists per connection id; re-joining overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSession {
    pub connection_id: Uuid,
    pub conversation_id: String,
    pub chatbot_id: String,
    pub user_id: String,
    pub customer_email: String,
}

/// A support-agent connection attached to a conversation.
///
/// At most one exists per connection id; re-joining overwrites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSession {
    pub connection_id: Uuid,
    pub conversation_id: String,
}

/// Whatever session records exist for one connection.
///
/// A connection is not prevented from registering as both customer and
/// agent, so both, one, or neither field may be populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionSessions {
    pub customer: Option<CustomerSession>,
    pub agent: Option<AgentSession>,
}

impl ConnectionSessions {
    /// True when the connection has no session records at all.
    pub fn is_empty(&self) -> bool {
        self.customer.is_none() && self.agent.is_none()
    }
}
