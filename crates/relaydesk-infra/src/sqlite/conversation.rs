//! SQLite conversation store implementation.
//!
//! Implements `ConversationStore` from `relaydesk-core` using sqlx with
//! split read/write pools. One row per conversation id; the message log is
//! a JSON array column rewritten wholesale on every append (full-document
//! replace semantics). Raw queries with a private Row struct for
//! SQLite-to-domain mapping.

use chrono::{DateTime, Utc};
use sqlx::Row;

use relaydesk_core::store::ConversationStore;
use relaydesk_types::conversation::{ConversationMeta, ConversationRecord, Message};
use relaydesk_types::error::StoreError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationStore`.
pub struct SqliteConversationStore {
    pool: DatabasePool,
}

impl SqliteConversationStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Full-row upsert keyed by conversation id: replaces the message log
    /// and metadata, preserves `created_at` for existing rows.
    async fn write_record(&self, record: &ConversationRecord) -> Result<(), StoreError> {
        let message_log = serde_json::to_string(&record.message_log)
            .map_err(|e| StoreError::WriteFailed(format!("message log encode: {e}")))?;

        sqlx::query(
            r#"INSERT INTO conversations
                (conversation_id, chatbot_id, customer_identifier, message_log, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(conversation_id) DO UPDATE SET
                chatbot_id = excluded.chatbot_id,
                customer_identifier = excluded.customer_identifier,
                message_log = excluded.message_log"#,
        )
        .bind(&record.conversation_id)
        .bind(&record.chatbot_id)
        .bind(&record.customer_identifier)
        .bind(&message_log)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(())
    }
}

/// Internal row type for mapping SQLite rows to domain ConversationRecord.
struct ConversationRow {
    conversation_id: String,
    chatbot_id: String,
    customer_identifier: String,
    message_log: String,
    created_at: String,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            conversation_id: row.try_get("conversation_id")?,
            chatbot_id: row.try_get("chatbot_id")?,
            customer_identifier: row.try_get("customer_identifier")?,
            message_log: row.try_get("message_log")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<ConversationRecord, StoreError> {
        let message_log: Vec<Message> = serde_json::from_str(&self.message_log)
            .map_err(|e| StoreError::Unavailable(format!("malformed message log: {e}")))?;
        let created_at = parse_datetime(&self.created_at)?;

        Ok(ConversationRecord {
            conversation_id: self.conversation_id,
            chatbot_id: self.chatbot_id,
            customer_identifier: self.customer_identifier,
            message_log,
            created_at,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Unavailable(format!("malformed timestamp '{s}': {e}")))
}

impl ConversationStore for SqliteConversationStore {
    async fn fetch(&self, conversation_id: &str) -> Result<Option<ConversationRecord>, StoreError> {
        let row = sqlx::query(
            r#"SELECT conversation_id, chatbot_id, customer_identifier, message_log, created_at
            FROM conversations
            WHERE conversation_id = ?"#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => {
                let row = ConversationRow::from_row(&row)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                Ok(Some(row.into_record()?))
            }
            None => Ok(None),
        }
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        message: &Message,
        meta: &ConversationMeta,
    ) -> Result<(), StoreError> {
        // Read-modify-write; ordering across concurrent appends to the
        // same id is the caller's responsibility.
        let mut record =
            self.fetch(conversation_id)
                .await?
                .unwrap_or_else(|| ConversationRecord {
                    conversation_id: conversation_id.to_string(),
                    chatbot_id: meta.chatbot_id.clone(),
                    customer_identifier: meta.customer_identifier.clone(),
                    message_log: Vec::new(),
                    created_at: Utc::now(),
                });

        record.chatbot_id = meta.chatbot_id.clone();
        record.customer_identifier = meta.customer_identifier.clone();
        record.message_log.push(message.clone());

        self.write_record(&record).await
    }

    async fn create_conversation(
        &self,
        conversation_id: &str,
        chatbot_id: &str,
        customer_identifier: &str,
    ) -> Result<(), StoreError> {
        // Idempotent: a conflicting create leaves the existing row (and
        // its message log) untouched.
        sqlx::query(
            r#"INSERT INTO conversations
                (conversation_id, chatbot_id, customer_identifier, message_log, created_at)
            VALUES (?, ?, ?, '[]', ?)
            ON CONFLICT(conversation_id) DO NOTHING"#,
        )
        .bind(conversation_id)
        .bind(chatbot_id)
        .bind(customer_identifier)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        Ok(())
    }
}

/// Conversation and message totals for the stats endpoint.
///
/// Message counts are computed in SQL with `json_array_length` rather than
/// decoding every log.
pub async fn store_counts(pool: &DatabasePool) -> Result<(u64, u64), StoreError> {
    let row = sqlx::query(
        r#"SELECT
            COUNT(*) AS conversation_count,
            COALESCE(SUM(json_array_length(message_log)), 0) AS message_count
        FROM conversations"#,
    )
    .fetch_one(&pool.reader)
    .await
    .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    let conversations: i64 = row
        .try_get("conversation_count")
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    let messages: i64 = row
        .try_get("message_count")
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

    Ok((conversations as u64, messages as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaydesk_types::conversation::Sender;

    async fn store() -> (tempfile::TempDir, SqliteConversationStore, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("relay.db").display()
        );
        let pool = DatabasePool::new(&url).await.unwrap();
        (dir, SqliteConversationStore::new(pool.clone()), pool)
    }

    fn message(conversation_id: &str, text: &str) -> Message {
        Message {
            text: text.to_string(),
            sender: Sender::Customer,
            timestamp: Utc::now(),
            conversation_id: conversation_id.to_string(),
        }
    }

    fn meta() -> ConversationMeta {
        ConversationMeta {
            chatbot_id: "bot-7".to_string(),
            customer_identifier: "u-42".to_string(),
        }
    }

    #[tokio::test]
    async fn fetch_missing_conversation_returns_none() {
        let (_dir, store, _pool) = store().await;
        assert!(store.fetch("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_log_missing_conversation_is_empty() {
        let (_dir, store, _pool) = store().await;
        assert!(store.read_log("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_then_fetch_returns_empty_log() {
        let (_dir, store, _pool) = store().await;
        store.create_conversation("c1", "bot-7", "u-42").await.unwrap();

        let record = store.fetch("c1").await.unwrap().unwrap();
        assert_eq!(record.conversation_id, "c1");
        assert_eq!(record.chatbot_id, "bot-7");
        assert_eq!(record.customer_identifier, "u-42");
        assert!(record.message_log.is_empty());
    }

    #[tokio::test]
    async fn create_is_idempotent_and_preserves_log() {
        let (_dir, store, _pool) = store().await;
        store.create_conversation("c1", "bot-7", "u-42").await.unwrap();
        store
            .append_message("c1", &message("c1", "hello"), &meta())
            .await
            .unwrap();

        // Second create must not clobber the stored history.
        store.create_conversation("c1", "bot-7", "u-42").await.unwrap();

        let record = store.fetch("c1").await.unwrap().unwrap();
        assert_eq!(record.message_log.len(), 1);
    }

    #[tokio::test]
    async fn append_to_missing_conversation_creates_row() {
        let (_dir, store, _pool) = store().await;
        store
            .append_message("c1", &message("c1", "hello"), &meta())
            .await
            .unwrap();

        let record = store.fetch("c1").await.unwrap().unwrap();
        assert_eq!(record.chatbot_id, "bot-7");
        assert_eq!(record.message_log.len(), 1);
        assert_eq!(record.message_log[0].text, "hello");
    }

    #[tokio::test]
    async fn appends_extend_log_in_order() {
        let (_dir, store, _pool) = store().await;
        for text in ["first", "second", "third"] {
            store
                .append_message("c1", &message("c1", text), &meta())
                .await
                .unwrap();
        }

        let texts: Vec<String> = store
            .read_log("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn appends_are_isolated_per_conversation() {
        let (_dir, store, _pool) = store().await;
        store
            .append_message("c1", &message("c1", "for c1"), &meta())
            .await
            .unwrap();
        store
            .append_message("c2", &message("c2", "for c2"), &meta())
            .await
            .unwrap();

        assert_eq!(store.read_log("c1").await.unwrap().len(), 1);
        assert_eq!(store.read_log("c2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_log_surfaces_as_unavailable() {
        let (_dir, store, pool) = store().await;
        sqlx::query(
            "INSERT INTO conversations (conversation_id, chatbot_id, customer_identifier, message_log, created_at)
            VALUES ('bad', 'bot-7', 'u-42', 'not json', ?)",
        )
        .bind(Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await
        .unwrap();

        let err = store.fetch("bad").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn store_counts_totals_rows_and_messages() {
        let (_dir, store, pool) = store().await;
        store.create_conversation("c1", "bot-7", "u-42").await.unwrap();
        store
            .append_message("c2", &message("c2", "one"), &meta())
            .await
            .unwrap();
        store
            .append_message("c2", &message("c2", "two"), &meta())
            .await
            .unwrap();

        let (conversations, messages) = store_counts(&pool).await.unwrap();
        assert_eq!(conversations, 2);
        assert_eq!(messages, 2);
    }
}
