// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the [`Store`] trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use wagent_config::model::StorageConfig;
use wagent_core::{
    AdapterType, AgentRecord, ConnectionState, DedupOutcome, HealthStatus, InboundDedupRecord,
    OutboundRecord, PermissionEntry, PermissionLists, PluginAdapter, Store, WagentError,
};

use crate::database::{Database, map_tr_err};
use crate::queries::{self, permissions::ListKind};

/// SQLite-backed durable store.
///
/// Besides the [`Store`] operations used by the runtime, it exposes the
/// provisioning calls (agents, permission lists, keys) and history reads
/// used by the command line and tests.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn open(config: &StorageConfig) -> Result<Self, WagentError> {
        Ok(Self::new(
            Database::open(&config.database_path, config.wal_mode).await?,
        ))
    }

    pub async fn open_in_memory() -> Result<Self, WagentError> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), WagentError> {
        self.db.close().await
    }

    pub async fn create_agent(
        &self,
        id: &str,
        name: &str,
        assistant_id: &str,
    ) -> Result<(), WagentError> {
        queries::agents::create_agent(&self.db, id, name, assistant_id).await
    }

    pub async fn allow(&self, agent_id: &str, entry: &PermissionEntry) -> Result<(), WagentError> {
        queries::permissions::add(&self.db, agent_id, ListKind::Whitelist, entry).await
    }

    pub async fn deny(&self, agent_id: &str, entry: &PermissionEntry) -> Result<(), WagentError> {
        queries::permissions::add(&self.db, agent_id, ListKind::Blacklist, entry).await
    }

    pub async fn remove_permission(
        &self,
        agent_id: &str,
        list: ListKind,
        identifier: &str,
    ) -> Result<bool, WagentError> {
        queries::permissions::remove(&self.db, agent_id, list, identifier).await
    }

    /// Stores an already-encrypted key under `name`.
    pub async fn set_api_key(
        &self,
        agent_id: &str,
        name: &str,
        encrypted: &str,
    ) -> Result<(), WagentError> {
        queries::keys::set(&self.db, agent_id, name, encrypted).await
    }

    pub async fn conversation_history(
        &self,
        agent_id: &str,
        chat_id: &str,
    ) -> Result<Vec<OutboundRecord>, WagentError> {
        queries::messages::conversation(&self.db, agent_id, chat_id).await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, WagentError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get_agent(&self, agent_id: &str) -> Result<Option<AgentRecord>, WagentError> {
        queries::agents::get_agent(&self.db, agent_id).await
    }

    async fn list_agents(&self) -> Result<Vec<AgentRecord>, WagentError> {
        queries::agents::list_agents(&self.db).await
    }

    async fn update_agent_state(
        &self,
        agent_id: &str,
        state: ConnectionState,
        at: DateTime<Utc>,
    ) -> Result<(), WagentError> {
        if !queries::agents::update_state(&self.db, agent_id, state, at).await? {
            debug!(agent_id, %state, "state update for unknown agent ignored");
        }
        Ok(())
    }

    async fn set_agent_phone(&self, agent_id: &str, phone: &str) -> Result<(), WagentError> {
        if !queries::agents::set_phone(&self.db, agent_id, phone).await? {
            debug!(agent_id, "phone update for unknown agent ignored");
        }
        Ok(())
    }

    async fn permission_lists(
        &self,
        agent_id: &str,
    ) -> Result<Option<PermissionLists>, WagentError> {
        if !queries::agents::agent_exists(&self.db, agent_id).await? {
            return Ok(None);
        }
        queries::permissions::lists(&self.db, agent_id).await.map(Some)
    }

    async fn record_inbound(
        &self,
        record: &InboundDedupRecord,
    ) -> Result<DedupOutcome, WagentError> {
        queries::inbound::record(&self.db, record).await
    }

    async fn find_thread(
        &self,
        agent_id: &str,
        chat_id: &str,
    ) -> Result<Option<String>, WagentError> {
        queries::threads::find(&self.db, agent_id, chat_id).await
    }

    async fn upsert_thread(
        &self,
        agent_id: &str,
        chat_id: &str,
        thread_id: &str,
    ) -> Result<(), WagentError> {
        queries::threads::upsert(&self.db, agent_id, chat_id, thread_id).await
    }

    async fn insert_outbound(&self, record: &OutboundRecord) -> Result<(), WagentError> {
        queries::messages::insert(&self.db, record).await.map(|_| ())
    }

    async fn api_key(&self, agent_id: &str, name: &str) -> Result<Option<String>, WagentError> {
        queries::keys::get(&self.db, agent_id, name).await
    }
}
