//! Live-connection session registry.
//!
//! Maps each connection id to its session records: customer, agent, or
//! both. State is intentionally unpersisted -- it is lost on process
//! restart and reconstructible from the durable store on demand.

use dashmap::DashMap;
use relaydesk_types::session::{AgentSession, ConnectionSessions, CustomerSession};
use uuid::Uuid;

/// Registry of which connection belongs to which conversation, by role.
///
/// Mutations are single-step map operations keyed by connection id, safe
/// under handler interleaving without additional locking.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    customers: DashMap<Uuid, CustomerSession>,
    agents: DashMap<Uuid, AgentSession>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a customer session, overwriting any prior one for the same
    /// connection id.
    pub fn register_customer(&self, session: CustomerSession) {
        self.customers.insert(session.connection_id, session);
    }

    /// Record an agent session, overwriting any prior one for the same
    /// connection id.
    pub fn register_agent(&self, session: AgentSession) {
        self.agents.insert(session.connection_id, session);
    }

    /// Whichever session records exist for a connection: both, one, or
    /// neither.
    pub fn lookup(&self, connection_id: &Uuid) -> ConnectionSessions {
        ConnectionSessions {
            customer: self.customers.get(connection_id).map(|s| s.value().clone()),
            agent: self.agents.get(connection_id).map(|s| s.value().clone()),
        }
    }

    /// Delete both records for a connection; no-op if absent.
    ///
    /// Called exactly once, on disconnect.
    pub fn remove(&self, connection_id: &Uuid) {
        self.customers.remove(connection_id);
        self.agents.remove(connection_id);
    }

    /// Number of live customer sessions.
    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    /// Number of live agent sessions.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(connection_id: Uuid, conversation_id: &str) -> CustomerSession {
        CustomerSession {
            connection_id,
            conversation_id: conversation_id.to_string(),
            chatbot_id: "bot-7".to_string(),
            user_id: "u-42".to_string(),
            customer_email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn register_and_lookup_customer() {
        let registry = SessionRegistry::new();
        let conn = Uuid::now_v7();
        registry.register_customer(customer(conn, "c1"));

        let sessions = registry.lookup(&conn);
        assert_eq!(sessions.customer.unwrap().conversation_id, "c1");
        assert!(sessions.agent.is_none());
    }

    #[test]
    fn rejoin_overwrites_prior_session() {
        let registry = SessionRegistry::new();
        let conn = Uuid::now_v7();
        registry.register_customer(customer(conn, "c1"));
        registry.register_customer(customer(conn, "c2"));

        let sessions = registry.lookup(&conn);
        assert_eq!(sessions.customer.unwrap().conversation_id, "c2");
        assert_eq!(registry.customer_count(), 1);
    }

    #[test]
    fn connection_may_hold_both_roles() {
        let registry = SessionRegistry::new();
        let conn = Uuid::now_v7();
        registry.register_customer(customer(conn, "c1"));
        registry.register_agent(AgentSession {
            connection_id: conn,
            conversation_id: "c1".to_string(),
        });

        let sessions = registry.lookup(&conn);
        assert!(sessions.customer.is_some());
        assert!(sessions.agent.is_some());
    }

    #[test]
    fn remove_deletes_both_records() {
        let registry = SessionRegistry::new();
        let conn = Uuid::now_v7();
        registry.register_customer(customer(conn, "c1"));
        registry.register_agent(AgentSession {
            connection_id: conn,
            conversation_id: "c1".to_string(),
        });

        registry.remove(&conn);

        assert!(registry.lookup(&conn).is_empty());
        assert_eq!(registry.customer_count(), 0);
        assert_eq!(registry.agent_count(), 0);
    }

    #[test]
    fn remove_absent_connection_is_noop() {
        let registry = SessionRegistry::new();
        registry.remove(&Uuid::now_v7());
        assert_eq!(registry.customer_count(), 0);
    }

    #[test]
    fn lookup_unknown_connection_returns_neither() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup(&Uuid::now_v7()).is_empty());
    }
}
