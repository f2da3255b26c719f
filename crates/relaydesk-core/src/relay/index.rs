//! In-memory index of recently active conversations.
//!
//! The index caches one [`ConversationSummary`] per conversation for
//! dashboard broadcast and staleness eviction. It is never the source of
//! truth: entries vanish on eviction or restart while the durable store
//! keeps the full history.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use relaydesk_types::conversation::{ConversationSummary, Message};

/// Cache of conversation summaries keyed by conversation id.
#[derive(Debug, Default)]
pub struct ConversationIndex {
    summaries: DashMap<String, ConversationSummary>,
}

impl ConversationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the summary for `summary.conversation_id`.
    pub fn upsert(&self, summary: ConversationSummary) {
        self.summaries.insert(summary.conversation_id.clone(), summary);
    }

    /// Record fresh activity: set the last message and bump the activity
    /// timestamp to now.
    ///
    /// No-op when the conversation is not present in the index -- the
    /// message was still durably stored regardless.
    pub fn touch(&self, conversation_id: &str, message: Message) {
        if let Some(mut entry) = self.summaries.get_mut(conversation_id) {
            entry.last_activity = Utc::now();
            entry.last_message = Some(message);
        }
    }

    /// All currently-held summaries. No ordering guarantee.
    pub fn snapshot(&self) -> Vec<ConversationSummary> {
        self.summaries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Remove every summary whose last activity predates `cutoff`.
    ///
    /// Pure in-memory operation; the durable store is untouched. Returns
    /// the number of summaries evicted.
    pub fn evict_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let before = self.summaries.len();
        self.summaries.retain(|_, summary| summary.last_activity >= cutoff);
        before - self.summaries.len()
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use relaydesk_types::conversation::Sender;

    fn summary(conversation_id: &str, last_activity: DateTime<Utc>) -> ConversationSummary {
        ConversationSummary {
            conversation_id: conversation_id.to_string(),
            chatbot_id: "bot-7".to_string(),
            customer_identifier: "u-42".to_string(),
            last_activity,
            last_message: None,
        }
    }

    fn message(conversation_id: &str, text: &str) -> Message {
        Message {
            text: text.to_string(),
            sender: Sender::Customer,
            timestamp: Utc::now(),
            conversation_id: conversation_id.to_string(),
        }
    }

    #[test]
    fn upsert_replaces_existing_summary() {
        let index = ConversationIndex::new();
        index.upsert(summary("c1", Utc::now() - Duration::hours(1)));
        let fresh = Utc::now();
        index.upsert(summary("c1", fresh));

        let snapshot = index.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].last_activity, fresh);
    }

    #[test]
    fn touch_updates_last_message_and_activity() {
        let index = ConversationIndex::new();
        let stale = Utc::now() - Duration::hours(1);
        index.upsert(summary("c1", stale));

        index.touch("c1", message("c1", "hello"));

        let snapshot = index.snapshot();
        assert_eq!(snapshot[0].last_message.as_ref().unwrap().text, "hello");
        assert!(snapshot[0].last_activity > stale);
    }

    #[test]
    fn touch_absent_conversation_is_noop() {
        let index = ConversationIndex::new();
        index.touch("nope", message("nope", "hello"));
        assert!(index.is_empty());
    }

    #[test]
    fn eviction_removes_two_hour_old_summary_at_one_hour_threshold() {
        let index = ConversationIndex::new();
        index.upsert(summary("stale", Utc::now() - Duration::hours(2)));

        let evicted = index.evict_older_than(Utc::now() - Duration::hours(1));

        assert_eq!(evicted, 1);
        assert!(index.is_empty());
    }

    #[test]
    fn eviction_keeps_thirty_minute_old_summary_at_one_hour_threshold() {
        let index = ConversationIndex::new();
        index.upsert(summary("fresh", Utc::now() - Duration::minutes(30)));

        let evicted = index.evict_older_than(Utc::now() - Duration::hours(1));

        assert_eq!(evicted, 0);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn eviction_is_selective() {
        let index = ConversationIndex::new();
        index.upsert(summary("stale", Utc::now() - Duration::hours(2)));
        index.upsert(summary("fresh", Utc::now()));

        index.evict_older_than(Utc::now() - Duration::hours(1));

        let snapshot = index.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].conversation_id, "fresh");
    }
}
