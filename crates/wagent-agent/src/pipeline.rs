// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound message pipeline: filter, dedup, queue, then drain under the
//! conversation lock.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use wagent_core::{ChatClient, ChatMessage, ConversationKey, Store, WagentError};

use crate::lock::ConversationLock;
use crate::permission::{author_identifier, is_allowed};
use crate::queue::MessageQueue;
use crate::responder::{AiResponder, InboundEnvelope};
use crate::threads::ThreadMapper;

const STATUS_BROADCAST: &str = "status@broadcast";

/// What happened to one inbound delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Own message or status broadcast.
    Ignored,
    /// Author not permitted.
    Denied,
    /// Already seen.
    Duplicate,
    /// Queued and drained.
    Processed,
}

/// Receives messages from a live chat client.
#[async_trait]
pub trait InboundHandler: Send + Sync + 'static {
    /// Handles one message for `agent_id`. Replies go out on `client`.
    async fn handle_inbound(
        &self,
        agent_id: &str,
        client: Arc<dyn ChatClient>,
        message: ChatMessage,
    ) -> Result<InboundOutcome, WagentError>;
}

/// Default [`InboundHandler`]: filters a delivery, records it for dedup,
/// queues it and drains the conversation under its lock.
///
/// Owns the process-wide message queue and conversation lock.
pub struct InboundPipeline {
    store: Arc<dyn Store>,
    threads: Arc<ThreadMapper>,
    queue: MessageQueue<InboundEnvelope>,
    locks: ConversationLock,
    responder: AiResponder,
}

impl InboundPipeline {
    /// `threads` should be the same mapper the responder uses, so the
    /// pre-warmed thread is the one the turn runs on.
    pub fn new(store: Arc<dyn Store>, threads: Arc<ThreadMapper>, responder: AiResponder) -> Self {
        Self {
            queue: MessageQueue::new(store.clone()),
            store,
            threads,
            locks: ConversationLock::new(),
            responder,
        }
    }
}

#[async_trait]
impl InboundHandler for InboundPipeline {
    async fn handle_inbound(
        &self,
        agent_id: &str,
        client: Arc<dyn ChatClient>,
        message: ChatMessage,
    ) -> Result<InboundOutcome, WagentError> {
        if message.from_me || message.from == STATUS_BROADCAST {
            return Ok(InboundOutcome::Ignored);
        }

        let lists = self
            .store
            .permission_lists(agent_id)
            .await?
            .ok_or_else(|| WagentError::AgentNotFound(agent_id.to_string()))?;
        let author = author_identifier(&message.from, message.author.as_deref());
        if !is_allowed(author, &lists.whitelist, &lists.blacklist) {
            info!(agent_id, author, "message from unpermitted author ignored");
            return Ok(InboundOutcome::Denied);
        }

        let key = ConversationKey::new(agent_id, &message.chat_id);

        // Warm the thread mapping before queueing so the drain does not
        // pay for thread creation.
        self.threads.get_or_create(&key).await?;

        let unique_id = message.id.clone();
        let timestamp_ms = message.timestamp_ms();
        let accepted = self
            .queue
            .enqueue(&key, &unique_id, timestamp_ms, InboundEnvelope { client, message })
            .await?;
        if !accepted {
            return Ok(InboundOutcome::Duplicate);
        }

        debug!(conversation = %key, %unique_id, "message queued");
        self.locks
            .run_exclusive(&key, || self.queue.drain(&key, &self.responder))
            .await;
        Ok(InboundOutcome::Processed)
    }
}
