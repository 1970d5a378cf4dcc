// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the agent runtime from its collaborators.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wagent_config::model::WagentConfig;
use wagent_core::{
    AssistantConnector, ChatClientFactory, StatusSink, Store, TextExtractor, WagentError,
};

use crate::lifecycle::SessionManager;
use crate::pipeline::InboundPipeline;
use crate::poll::RunPoller;
use crate::responder::AiResponder;
use crate::threads::ThreadMapper;

/// External collaborators the runtime is built from.
pub struct RuntimeDeps {
    pub store: Arc<dyn Store>,
    pub factory: Arc<dyn ChatClientFactory>,
    pub connector: Arc<dyn AssistantConnector>,
    pub ocr: Arc<dyn TextExtractor>,
    pub status: Arc<dyn StatusSink>,
}

/// Tunables taken from `[sessions]` and `[polling]`.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Parent of the per-agent session directories.
    pub sessions_root: PathBuf,
    /// Spacing between run-status checks.
    pub poll_interval: Duration,
    /// Status checks before a run is declared timed out.
    pub poll_max_attempts: u32,
}

impl RuntimeSettings {
    pub fn from_config(config: &WagentConfig) -> Self {
        Self {
            sessions_root: PathBuf::from(&config.sessions.data_dir),
            poll_interval: Duration::from_millis(config.polling.interval_ms),
            poll_max_attempts: config.polling.max_attempts,
        }
    }
}

/// Session manager plus the inbound pipeline behind it.
pub struct AgentRuntime {
    sessions: SessionManager,
    store: Arc<dyn Store>,
}

impl AgentRuntime {
    /// Wires every component once. Cancelling `shutdown` ends event loops
    /// and pending run polls.
    pub fn new(deps: RuntimeDeps, settings: RuntimeSettings, shutdown: CancellationToken) -> Self {
        let RuntimeDeps {
            store,
            factory,
            connector,
            ocr,
            status,
        } = deps;

        let threads = Arc::new(ThreadMapper::new(store.clone(), connector.clone()));
        let poller = RunPoller::new(settings.poll_interval, settings.poll_max_attempts)
            .with_cancellation(shutdown.clone());
        let responder = AiResponder::new(store.clone(), connector, threads.clone(), ocr, poller);
        let pipeline = Arc::new(InboundPipeline::new(store.clone(), threads, responder));
        let sessions = SessionManager::new(
            store.clone(),
            factory,
            status,
            pipeline,
            settings.sessions_root,
            shutdown,
        );

        Self { sessions, store }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Starts every stored agent. Failures are logged and skipped.
    pub async fn start_all(&self) -> Result<usize, WagentError> {
        let agents = self.store.list_agents().await?;
        let mut started = 0;
        for agent in agents {
            match self.sessions.start(&agent.id).await {
                Ok(()) => started += 1,
                Err(e) => warn!(agent_id = %agent.id, error = %e, "agent failed to start"),
            }
        }
        info!(started, "agents started");
        Ok(started)
    }

    /// Stops every live client.
    pub async fn shutdown(&self) {
        self.sessions.stop_all().await;
    }
}
