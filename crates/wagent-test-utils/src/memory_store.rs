// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store for deterministic testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wagent_core::{
    AgentRecord, ConnectionState, DedupOutcome, InboundDedupRecord, OutboundRecord,
    PermissionEntry, PermissionLists, PermissionScope, Store, WagentError,
};

use crate::lock;

#[derive(Default)]
struct State {
    agents: HashMap<String, AgentRecord>,
    lists: HashMap<String, PermissionLists>,
    inbound: HashSet<(String, String, String)>,
    threads: HashMap<(String, String), String>,
    outbound: Vec<OutboundRecord>,
}

/// A [`Store`] backed by hash maps.
///
/// `fail_inbound(true)` makes `record_inbound` return a storage error,
/// simulating a database outage during dedup.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_inbound: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an agent whose whitelist allows everyone.
    pub fn add_agent(&self, id: &str, assistant_id: &str) {
        let mut state = lock(&self.state);
        state.agents.insert(
            id.to_string(),
            AgentRecord {
                id: id.to_string(),
                name: id.to_string(),
                assistant_id: assistant_id.to_string(),
                state: ConnectionState::Disconnected,
                last_state_change_at: None,
                phone_number: None,
            },
        );
        state.lists.insert(
            id.to_string(),
            PermissionLists {
                whitelist: vec![PermissionEntry::new(PermissionScope::All, "")],
                blacklist: Vec::new(),
            },
        );
    }

    /// Replaces the agent's permission lists.
    pub fn set_lists(&self, agent_id: &str, lists: PermissionLists) {
        lock(&self.state).lists.insert(agent_id.to_string(), lists);
    }

    pub fn set_thread(&self, agent_id: &str, chat_id: &str, thread_id: &str) {
        lock(&self.state).threads.insert(
            (agent_id.to_string(), chat_id.to_string()),
            thread_id.to_string(),
        );
    }

    pub fn thread(&self, agent_id: &str, chat_id: &str) -> Option<String> {
        lock(&self.state)
            .threads
            .get(&(agent_id.to_string(), chat_id.to_string()))
            .cloned()
    }

    pub fn agent(&self, agent_id: &str) -> Option<AgentRecord> {
        lock(&self.state).agents.get(agent_id).cloned()
    }

    pub fn outbound(&self) -> Vec<OutboundRecord> {
        lock(&self.state).outbound.clone()
    }

    pub fn fail_inbound(&self, fail: bool) {
        self.fail_inbound.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_agent(&self, agent_id: &str) -> Result<Option<AgentRecord>, WagentError> {
        Ok(self.agent(agent_id))
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, WagentError> {
        let mut agents: Vec<_> = lock(&self.state).agents.values().cloned().collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(agents)
    }

    async fn update_agent_state(
        &self,
        agent_id: &str,
        state: ConnectionState,
        at: DateTime<Utc>,
    ) -> Result<(), WagentError> {
        if let Some(agent) = lock(&self.state).agents.get_mut(agent_id) {
            agent.state = state;
            agent.last_state_change_at = Some(at);
        }
        Ok(())
    }

    async fn set_agent_phone(&self, agent_id: &str, phone: &str) -> Result<(), WagentError> {
        if let Some(agent) = lock(&self.state).agents.get_mut(agent_id) {
            agent.phone_number = Some(phone.to_string());
        }
        Ok(())
    }

    async fn permission_lists(
        &self,
        agent_id: &str,
    ) -> Result<Option<PermissionLists>, WagentError> {
        let state = lock(&self.state);
        if !state.agents.contains_key(agent_id) {
            return Ok(None);
        }
        Ok(Some(state.lists.get(agent_id).cloned().unwrap_or_default()))
    }

    async fn record_inbound(
        &self,
        record: &InboundDedupRecord,
    ) -> Result<DedupOutcome, WagentError> {
        if self.fail_inbound.load(Ordering::SeqCst) {
            return Err(WagentError::Internal("dedup table unavailable".into()));
        }
        let fresh = lock(&self.state).inbound.insert((
            record.agent_id.clone(),
            record.chat_id.clone(),
            record.unique_message_id.clone(),
        ));
        Ok(if fresh {
            DedupOutcome::Inserted
        } else {
            DedupOutcome::Duplicate
        })
    }

    async fn find_thread(
        &self,
        agent_id: &str,
        chat_id: &str,
    ) -> Result<Option<String>, WagentError> {
        Ok(self.thread(agent_id, chat_id))
    }

    async fn upsert_thread(
        &self,
        agent_id: &str,
        chat_id: &str,
        thread_id: &str,
    ) -> Result<(), WagentError> {
        self.set_thread(agent_id, chat_id, thread_id);
        Ok(())
    }

    async fn insert_outbound(&self, record: &OutboundRecord) -> Result<(), WagentError> {
        lock(&self.state).outbound.push(record.clone());
        Ok(())
    }

    /// Keys are not modelled; [`MockAssistant`](crate::MockAssistant) needs none.
    async fn api_key(&self, _agent_id: &str, _name: &str) -> Result<Option<String>, WagentError> {
        Ok(None)
    }
}
