//! Application state wiring the relay together.
//!
//! AppState pins the coordinator's generic ports to the concrete
//! implementations: `SqliteConversationStore` for persistence and
//! `WsTransport` for delivery. Used by the WebSocket handler and the REST
//! handlers alike.

use std::path::PathBuf;
use std::sync::Arc;

use relaydesk_core::relay::{ConversationIndex, Coordinator};
use relaydesk_infra::config::{load_config, resolve_data_dir};
use relaydesk_infra::sqlite::conversation::SqliteConversationStore;
use relaydesk_infra::sqlite::pool::DatabasePool;
use relaydesk_types::config::RelayConfig;

use crate::ws::WsTransport;

/// The coordinator with its ports pinned to the infra implementations.
pub type ConcreteCoordinator = Coordinator<SqliteConversationStore, WsTransport>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ConcreteCoordinator>,
    pub transport: Arc<WsTransport>,
    pub index: Arc<ConversationIndex>,
    /// Store handle for read-only REST queries (the coordinator owns its
    /// own instance over the same pool).
    pub store: Arc<SqliteConversationStore>,
    pub db_pool: DatabasePool,
    pub config: RelayConfig,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Initialize the application state: resolve the data directory, load
    /// config, connect to the database, and wire the coordinator.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_url = format!(
            "sqlite://{}?mode=rwc",
            data_dir.join("relaydesk.db").display()
        );
        let db_pool = DatabasePool::new(&db_url).await?;

        let transport = Arc::new(WsTransport::new(config.outbound_buffer));
        let index = Arc::new(ConversationIndex::new());
        let coordinator = Arc::new(Coordinator::new(
            SqliteConversationStore::new(db_pool.clone()),
            Arc::clone(&transport),
            Arc::clone(&index),
        ));
        let store = Arc::new(SqliteConversationStore::new(db_pool.clone()));

        Ok(Self {
            coordinator,
            transport,
            index,
            store,
            db_pool,
            config,
            data_dir,
        })
    }
}
