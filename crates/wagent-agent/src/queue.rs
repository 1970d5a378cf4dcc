// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation message queue with durable deduplication.
//!
//! Every delivery is first recorded in the store's dedup table; only a
//! fresh insert is admitted to the in-memory queue. Draining hands
//! messages to a [`QueueHandler`] in ascending timestamp order, with ties
//! broken by arrival order. Handler failures are logged and the message is
//! dropped, so one bad message never blocks the rest of the conversation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, error};
use wagent_core::{ConversationKey, DedupOutcome, InboundDedupRecord, Store, WagentError};

/// One queued delivery.
#[derive(Debug, Clone)]
pub struct QueuedMessage<T> {
    /// Chat-platform message id, the dedup key within a conversation.
    pub unique_id: String,
    /// Arrival timestamp in milliseconds; drain order follows it.
    pub timestamp_ms: i64,
    /// Opaque payload handed to the [`QueueHandler`].
    pub payload: T,
    /// Set by the drain loop just before the handler runs.
    pub processed: bool,
    /// Insertion order, breaks timestamp ties.
    seq: u64,
}

/// Consumer of drained messages.
#[async_trait]
pub trait QueueHandler<T>: Send + Sync {
    async fn handle(
        &self,
        key: &ConversationKey,
        message: &QueuedMessage<T>,
    ) -> Result<(), WagentError>;
}

/// Pending messages for every conversation, keyed by (agent, chat).
///
/// Enqueue is safe to call concurrently; the store's insert decides
/// acceptance. [`MessageQueue::drain`] takes no lock of its own and must run
/// under the conversation's [`ConversationLock`](crate::ConversationLock).
pub struct MessageQueue<T> {
    store: Arc<dyn Store>,
    queues: DashMap<ConversationKey, Vec<QueuedMessage<T>>>,
    seq: AtomicU64,
}

impl<T> MessageQueue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an empty queue recording deliveries in `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            queues: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    /// Records the delivery and, when it is new, appends it to the queue.
    ///
    /// Returns `Ok(false)` for a duplicate. A store failure is returned as
    /// an error and the message is not queued.
    pub async fn enqueue(
        &self,
        key: &ConversationKey,
        unique_id: &str,
        timestamp_ms: i64,
        payload: T,
    ) -> Result<bool, WagentError> {
        let record = InboundDedupRecord {
            agent_id: key.agent_id.clone(),
            chat_id: key.chat_id.clone(),
            unique_message_id: unique_id.to_string(),
            timestamp_ms,
        };

        if self.store.record_inbound(&record).await? == DedupOutcome::Duplicate {
            debug!(conversation = %key, unique_id, "duplicate delivery dropped");
            return Ok(false);
        }

        let message = QueuedMessage {
            unique_id: unique_id.to_string(),
            timestamp_ms,
            payload,
            processed: false,
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
        };
        self.queues.entry(key.clone()).or_default().push(message);
        Ok(true)
    }

    /// Processes every pending message for `key`, oldest first.
    ///
    /// Callers serialize drains per key (see
    /// [`ConversationLock`](crate::lock::ConversationLock)); messages
    /// enqueued while a drain is running are picked up by the same drain.
    pub async fn drain<H>(&self, key: &ConversationKey, handler: &H)
    where
        H: QueueHandler<T> + ?Sized,
    {
        while let Some(message) = self.next_pending(key) {
            if let Err(e) = handler.handle(key, &message).await {
                error!(
                    conversation = %key,
                    unique_id = %message.unique_id,
                    error = %e,
                    "message handling failed"
                );
            }
            self.remove_processed(key);
        }
    }

    /// Number of queued messages for `key` that have not been picked yet.
    pub fn pending(&self, key: &ConversationKey) -> usize {
        self.queues
            .get(key)
            .map(|q| q.iter().filter(|m| !m.processed).count())
            .unwrap_or(0)
    }

    fn next_pending(&self, key: &ConversationKey) -> Option<QueuedMessage<T>> {
        let mut queue = self.queues.get_mut(key)?;
        let next = queue
            .iter_mut()
            .filter(|m| !m.processed)
            .min_by_key(|m| (m.timestamp_ms, m.seq))?;
        next.processed = true;
        Some(next.clone())
    }

    fn remove_processed(&self, key: &ConversationKey) {
        let emptied = match self.queues.get_mut(key) {
            Some(mut queue) => {
                queue.retain(|m| !m.processed);
                queue.is_empty()
            }
            None => false,
        };
        if emptied {
            self.queues.remove_if(key, |_, q| q.is_empty());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing_test::traced_test;
    use wagent_test_utils::MemoryStore;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl QueueHandler<&'static str> for Recorder {
        async fn handle(
            &self,
            _key: &ConversationKey,
            message: &QueuedMessage<&'static str>,
        ) -> Result<(), WagentError> {
            self.seen.lock().unwrap().push(message.payload.to_string());
            if self.fail_on == Some(message.payload) {
                return Err(WagentError::Internal("boom".into()));
            }
            Ok(())
        }
    }

    fn key() -> ConversationKey {
        ConversationKey::new("agent-1", "chat-1")
    }

    #[tokio::test]
    async fn drains_in_timestamp_order() {
        let queue = MessageQueue::new(Arc::new(MemoryStore::new()));
        assert!(queue.enqueue(&key(), "m1", 100, "m1").await.unwrap());
        assert!(queue.enqueue(&key(), "m2", 50, "m2").await.unwrap());
        assert_eq!(queue.pending(&key()), 2);

        let recorder = Recorder::default();
        queue.drain(&key(), &recorder).await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["m2", "m1"]);
        assert_eq!(queue.pending(&key()), 0);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_arrival_order() {
        let queue = MessageQueue::new(Arc::new(MemoryStore::new()));
        queue.enqueue(&key(), "a", 10, "a").await.unwrap();
        queue.enqueue(&key(), "b", 10, "b").await.unwrap();
        queue.enqueue(&key(), "c", 10, "c").await.unwrap();

        let recorder = Recorder::default();
        queue.drain(&key(), &recorder).await;
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn duplicate_is_rejected() {
        let queue = MessageQueue::new(Arc::new(MemoryStore::new()));
        assert!(queue.enqueue(&key(), "m1", 1, "first").await.unwrap());
        assert!(!queue.enqueue(&key(), "m1", 1, "again").await.unwrap());
        assert_eq!(queue.pending(&key()), 1);
    }

    #[tokio::test]
    async fn store_outage_is_an_error_not_a_duplicate() {
        let store = Arc::new(MemoryStore::new());
        store.fail_inbound(true);
        let queue = MessageQueue::new(store);
        assert!(queue.enqueue(&key(), "m1", 1, "m1").await.is_err());
        assert_eq!(queue.pending(&key()), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn failing_message_does_not_block_the_rest() {
        let queue = MessageQueue::new(Arc::new(MemoryStore::new()));
        queue.enqueue(&key(), "m1", 100, "m1").await.unwrap();
        queue.enqueue(&key(), "m2", 50, "m2").await.unwrap();

        let recorder = Recorder {
            fail_on: Some("m2"),
            ..Default::default()
        };
        queue.drain(&key(), &recorder).await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["m2", "m1"]);
        assert_eq!(queue.pending(&key()), 0);
        assert!(logs_contain("message handling failed"));
    }

    #[tokio::test]
    async fn conversations_are_independent() {
        let queue = MessageQueue::new(Arc::new(MemoryStore::new()));
        let other = ConversationKey::new("agent-1", "chat-2");
        queue.enqueue(&key(), "m1", 1, "m1").await.unwrap();
        queue.enqueue(&other, "m1", 1, "other").await.unwrap();

        let recorder = Recorder::default();
        queue.drain(&key(), &recorder).await;
        assert_eq!(*recorder.seen.lock().unwrap(), vec!["m1"]);
        assert_eq!(queue.pending(&other), 1);
    }
}
