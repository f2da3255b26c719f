//! Periodic eviction of stale conversations from the in-memory index.
//!
//! The sweeper is a cancellable scheduled task owned by the process
//! lifecycle, so it can be stopped deterministically in tests and on
//! shutdown. It touches only the conversation index and the dashboard
//! broadcast channel -- never sessions, never the durable store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use relaydesk_types::event::ServerEvent;

use crate::relay::index::ConversationIndex;
use crate::transport::Transport;

/// Evicts conversations inactive beyond a threshold on a fixed period.
pub struct EvictionSweeper<T> {
    index: Arc<ConversationIndex>,
    transport: Arc<T>,
    period: Duration,
    threshold: chrono::Duration,
}

impl<T> EvictionSweeper<T>
where
    T: Transport + 'static,
{
    pub fn new(
        index: Arc<ConversationIndex>,
        transport: Arc<T>,
        period: Duration,
        threshold: chrono::Duration,
    ) -> Self {
        Self {
            index,
            transport,
            period,
            threshold,
        }
    }

    /// One sweep: evict everything older than `now - threshold`, then
    /// rebroadcast the snapshot to dashboard subscribers -- even when
    /// nothing was evicted, so dashboard state converges with wall-clock
    /// staleness.
    pub async fn sweep_once(&self) {
        let cutoff = Utc::now() - self.threshold;
        let evicted = self.index.evict_older_than(cutoff);
        if evicted > 0 {
            info!(evicted, remaining = self.index.len(), "evicted stale conversations");
        } else {
            debug!(remaining = self.index.len(), "sweep found nothing stale");
        }
        self.transport
            .publish_to_all(&ServerEvent::ChatUpdated {
                summaries: self.index.snapshot(),
            })
            .await;
    }

    /// Start the periodic task. The first sweep runs one full period after
    /// spawn, then every period thereafter.
    pub fn spawn(self) -> SweeperHandle {
        let token = CancellationToken::new();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            // The first tick of a tokio interval resolves immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => self.sweep_once().await,
                }
            }
            debug!("eviction sweeper stopped");
        });
        SweeperHandle { token, handle }
    }
}

/// Handle for deterministically stopping a spawned sweeper.
pub struct SweeperHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Cancel the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use relaydesk_types::conversation::ConversationSummary;
    use std::sync::Mutex as StdMutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct BroadcastSink {
        broadcasts: StdMutex<Vec<ServerEvent>>,
    }

    impl Transport for BroadcastSink {
        async fn subscribe(&self, _connection_id: Uuid, _topic: &str) {}

        async fn publish(&self, _topic: &str, _event: &ServerEvent) {}

        async fn publish_to_all(&self, event: &ServerEvent) {
            self.broadcasts.lock().unwrap().push(event.clone());
        }

        async fn send(&self, _connection_id: Uuid, _event: &ServerEvent) {}
    }

    fn summary(conversation_id: &str, last_activity: DateTime<Utc>) -> ConversationSummary {
        ConversationSummary {
            conversation_id: conversation_id.to_string(),
            chatbot_id: "bot-7".to_string(),
            customer_identifier: "u-42".to_string(),
            last_activity,
            last_message: None,
        }
    }

    #[tokio::test]
    async fn sweep_evicts_stale_and_rebroadcasts() {
        let index = Arc::new(ConversationIndex::new());
        index.upsert(summary("stale", Utc::now() - chrono::Duration::hours(2)));
        index.upsert(summary("fresh", Utc::now() - chrono::Duration::minutes(30)));
        let transport = Arc::new(BroadcastSink::default());

        let sweeper = EvictionSweeper::new(
            Arc::clone(&index),
            Arc::clone(&transport),
            Duration::from_secs(60),
            chrono::Duration::hours(1),
        );
        sweeper.sweep_once().await;

        assert_eq!(index.len(), 1);
        let broadcasts = transport.broadcasts.lock().unwrap();
        assert_eq!(broadcasts.len(), 1);
        match &broadcasts[0] {
            ServerEvent::ChatUpdated { summaries } => {
                assert_eq!(summaries.len(), 1);
                assert_eq!(summaries[0].conversation_id, "fresh");
            }
            other => panic!("unexpected broadcast: {other:?}"),
        }
    }

    #[tokio::test]
    async fn sweep_broadcasts_even_when_nothing_evicted() {
        let index = Arc::new(ConversationIndex::new());
        let transport = Arc::new(BroadcastSink::default());

        let sweeper = EvictionSweeper::new(
            index,
            Arc::clone(&transport),
            Duration::from_secs(60),
            chrono::Duration::hours(1),
        );
        sweeper.sweep_once().await;
        sweeper.sweep_once().await;

        assert_eq!(transport.broadcasts.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_sweeper_ticks_on_period() {
        let index = Arc::new(ConversationIndex::new());
        index.upsert(summary("stale", Utc::now() - chrono::Duration::hours(2)));
        let transport = Arc::new(BroadcastSink::default());

        let handle = EvictionSweeper::new(
            Arc::clone(&index),
            Arc::clone(&transport),
            Duration::from_secs(60),
            chrono::Duration::hours(1),
        )
        .spawn();

        // Nothing happens before the first period elapses.
        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(transport.broadcasts.lock().unwrap().len(), 0);
        assert_eq!(index.len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.broadcasts.lock().unwrap().len(), 1);
        assert!(index.is_empty());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_ticking() {
        let index = Arc::new(ConversationIndex::new());
        let transport = Arc::new(BroadcastSink::default());

        let handle = EvictionSweeper::new(
            index,
            Arc::clone(&transport),
            Duration::from_secs(60),
            chrono::Duration::hours(1),
        )
        .spawn();

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert_eq!(transport.broadcasts.lock().unwrap().len(), 0);
    }
}
