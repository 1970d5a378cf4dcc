// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation to assistant-thread mapping.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use wagent_core::{AssistantConnector, ConversationKey, Store, WagentError};

/// Resolves the assistant thread for a conversation.
///
/// Lookups go memory cache, then store, then a freshly created remote
/// thread. A stored id is validated against the backend before first use
/// in this process; a thread that no longer exists, or whose check fails,
/// is replaced. Creation is serialized per key so concurrent callers
/// share one new thread.
pub struct ThreadMapper {
    store: Arc<dyn Store>,
    connector: Arc<dyn AssistantConnector>,
    cache: DashMap<ConversationKey, String>,
    gates: DashMap<ConversationKey, Arc<Mutex<()>>>,
}

impl ThreadMapper {
    pub fn new(store: Arc<dyn Store>, connector: Arc<dyn AssistantConnector>) -> Self {
        Self {
            store,
            connector,
            cache: DashMap::new(),
            gates: DashMap::new(),
        }
    }

    /// Thread id for the conversation, creating and storing one if needed.
    pub async fn get_or_create(&self, key: &ConversationKey) -> Result<String, WagentError> {
        if let Some(id) = self.cached(key) {
            return Ok(id);
        }

        let gate = self.gates.entry(key.clone()).or_default().clone();
        let _guard = gate.lock().await;

        // Another caller may have finished while we waited.
        if let Some(id) = self.cached(key) {
            return Ok(id);
        }

        let backend = self.connector.connect(&key.agent_id).await?;

        if let Some(stored) = self.store.find_thread(&key.agent_id, &key.chat_id).await? {
            match backend.thread_exists(&stored).await {
                Ok(true) => {
                    debug!(conversation = %key, thread_id = %stored, "reusing stored thread");
                    self.cache.insert(key.clone(), stored.clone());
                    return Ok(stored);
                }
                Ok(false) => {
                    info!(conversation = %key, thread_id = %stored, "stored thread is gone, replacing");
                }
                Err(e) => {
                    warn!(
                        conversation = %key,
                        thread_id = %stored,
                        error = %e,
                        "thread validation failed, replacing"
                    );
                }
            }
        }

        let thread_id = backend.create_thread().await?;
        self.store
            .upsert_thread(&key.agent_id, &key.chat_id, &thread_id)
            .await?;
        self.cache.insert(key.clone(), thread_id.clone());
        info!(conversation = %key, thread_id = %thread_id, "created assistant thread");
        Ok(thread_id)
    }

    fn cached(&self, key: &ConversationKey) -> Option<String> {
        self.cache.get(key).map(|id| id.value().clone())
    }
}
