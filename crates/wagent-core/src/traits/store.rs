// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store consumed by the core.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::WagentError;
use crate::types::{
    AgentRecord, ConnectionState, DedupOutcome, InboundDedupRecord, OutboundRecord,
    PermissionLists,
};

/// Persistence of agent state, dedup records, thread mappings and replies.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn get_agent(&self, agent_id: &str) -> Result<Option<AgentRecord>, WagentError>;

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, WagentError>;

    async fn update_agent_state(
        &self,
        agent_id: &str,
        state: ConnectionState,
        at: DateTime<Utc>,
    ) -> Result<(), WagentError>;

    async fn set_agent_phone(&self, agent_id: &str, phone: &str) -> Result<(), WagentError>;

    /// Returns `None` when the agent does not exist.
    async fn permission_lists(&self, agent_id: &str)
    -> Result<Option<PermissionLists>, WagentError>;

    /// Atomically records an inbound delivery.
    ///
    /// Must report [`DedupOutcome::Duplicate`] only when a record for the
    /// same (agent, chat, message) triple already exists. Any other failure
    /// is returned as `Err`.
    async fn record_inbound(&self, record: &InboundDedupRecord)
    -> Result<DedupOutcome, WagentError>;

    async fn find_thread(&self, agent_id: &str, chat_id: &str)
    -> Result<Option<String>, WagentError>;

    /// Insert-or-update keyed by (agent, chat).
    async fn upsert_thread(
        &self,
        agent_id: &str,
        chat_id: &str,
        thread_id: &str,
    ) -> Result<(), WagentError>;

    async fn insert_outbound(&self, record: &OutboundRecord) -> Result<(), WagentError>;

    /// Returns the stored (still encrypted) API key with the given name.
    async fn api_key(&self, agent_id: &str, name: &str) -> Result<Option<String>, WagentError>;
}
