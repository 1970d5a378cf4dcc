// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent session lifecycle.
//!
//! One [`SessionManager`] owns every agent's chat client. Each agent has a
//! slot whose async mutex serializes lifecycle operations (start, stop,
//! reset, recovery) and holds the live client. Every client gets a
//! generation number; event handlers act only while their generation is
//! still the live one, so a stale client can never tear down its
//! successor.
//!
//! State machine:
//!
//! ```text
//!  start ─► INITIALIZING ─► REQUESTING_QR ─► AUTHENTICATED ─► CONNECTED
//!                 │                                              │
//!                 └──────────── failure / transient drop ────────┴─► DISCONNECTED
//!  logout / auth failure ─► RECOVERING ─► REQUESTING_QR ─► INITIALIZING ...
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use wagent_core::{
    ChatClient, ChatClientFactory, ClientConnection, ClientEvent, ConnectionState, StatusEvent,
    StatusSink, StatusSnapshot, Store, WagentError,
};

use crate::pipeline::InboundHandler;
use crate::qr::qr_data_url;
use crate::session_dir;

const LOGOUT_MARKERS: [&str; 4] = ["LOGOUT", "UNPAIRED", "INVALID", "REVOKED"];

/// Whether a disconnect reason means the pairing is gone.
pub fn is_logout_reason(reason: &str) -> bool {
    let upper = reason.to_uppercase();
    LOGOUT_MARKERS.iter().any(|m| upper.contains(m))
}

struct LiveClient {
    client: Arc<dyn ChatClient>,
    generation: u64,
    stop: CancellationToken,
}

#[derive(Default)]
struct AgentSlot {
    live: Mutex<Option<LiveClient>>,
}

struct Inner {
    store: Arc<dyn Store>,
    factory: Arc<dyn ChatClientFactory>,
    status: Arc<dyn StatusSink>,
    inbound: Arc<dyn InboundHandler>,
    sessions_root: PathBuf,
    slots: DashMap<String, Arc<AgentSlot>>,
    statuses: DashMap<String, StatusSnapshot>,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

/// Owns chat clients and drives the per-agent state machine.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Creates a manager with no live clients.
    ///
    /// Session directories live under `sessions_root`. Every client's event
    /// loop stops when `shutdown` is cancelled.
    pub fn new(
        store: Arc<dyn Store>,
        factory: Arc<dyn ChatClientFactory>,
        status: Arc<dyn StatusSink>,
        inbound: Arc<dyn InboundHandler>,
        sessions_root: PathBuf,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                factory,
                status,
                inbound,
                sessions_root,
                slots: DashMap::new(),
                statuses: DashMap::new(),
                generation: AtomicU64::new(0),
                shutdown,
            }),
        }
    }

    /// Starts the agent's client. A no-op when one is already live.
    pub async fn start(&self, agent_id: &str) -> Result<(), WagentError> {
        if self.inner.store.get_agent(agent_id).await?.is_none() {
            return Err(WagentError::AgentNotFound(agent_id.to_string()));
        }

        let slot = self.inner.slot(agent_id);
        let mut live = slot.live.lock().await;
        if live.is_some() {
            debug!(agent_id, "client already running");
            return Ok(());
        }

        match self.inner.launch(agent_id).await {
            Ok(client) => {
                *live = Some(client);
                Ok(())
            }
            Err(e) => {
                error!(agent_id, error = %e, "failed to start client");
                self.inner
                    .set_state(agent_id, ConnectionState::Disconnected, Some(e.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    /// Destroys the live client, if any, and marks the agent disconnected.
    pub async fn stop(&self, agent_id: &str) {
        let slot = self.inner.slot(agent_id);
        let mut live = slot.live.lock().await;
        if let Some(old) = live.take() {
            self.inner.teardown(agent_id, old).await;
        }
        self.inner
            .set_state(agent_id, ConnectionState::Disconnected, None)
            .await;
    }

    /// Forgets the pairing and starts over with a fresh QR flow.
    pub async fn reset(&self, agent_id: &str) -> Result<(), WagentError> {
        if self.inner.store.get_agent(agent_id).await?.is_none() {
            return Err(WagentError::AgentNotFound(agent_id.to_string()));
        }
        {
            let slot = self.inner.slot(agent_id);
            let mut live = slot.live.lock().await;
            if let Some(old) = live.take() {
                self.inner.teardown(agent_id, old).await;
            }
            if let Err(e) = session_dir::wipe(&self.inner.sessions_root, agent_id).await {
                warn!(agent_id, error = %e, "could not remove session directory");
            }
            self.inner
                .set_state(agent_id, ConnectionState::RequestingQr, None)
                .await;
        }
        self.start(agent_id).await
    }

    /// Last known status; agents never seen report `DISCONNECTED`.
    pub fn status(&self, agent_id: &str) -> StatusSnapshot {
        self.inner
            .statuses
            .get(agent_id)
            .map(|s| s.value().clone())
            .unwrap_or_else(StatusSnapshot::unknown)
    }

    pub async fn has_saved_session(&self, agent_id: &str) -> bool {
        session_dir::has_saved_session(&self.inner.sessions_root, agent_id).await
    }

    /// Whether a client is currently attached for the agent.
    pub async fn is_running(&self, agent_id: &str) -> bool {
        match self.inner.slots.get(agent_id).map(|s| s.value().clone()) {
            Some(slot) => slot.live.lock().await.is_some(),
            None => false,
        }
    }

    /// Stops every agent. Used on shutdown.
    pub async fn stop_all(&self) {
        let agents: Vec<String> = self.inner.slots.iter().map(|e| e.key().clone()).collect();
        for agent_id in agents {
            self.stop(&agent_id).await;
        }
        info!("all agent sessions stopped");
    }
}

impl Inner {
    fn slot(&self, agent_id: &str) -> Arc<AgentSlot> {
        self.slots
            .entry(agent_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    async fn set_state(&self, agent_id: &str, state: ConnectionState, reason: Option<String>) {
        let snapshot = StatusSnapshot::now(state, reason);
        self.statuses.insert(agent_id.to_string(), snapshot.clone());
        info!(agent_id, %state, reason = ?snapshot.reason, "agent state changed");
        self.status
            .emit(agent_id, StatusEvent::Status(snapshot.clone()));
        if let Err(e) = self
            .store
            .update_agent_state(agent_id, state, snapshot.ts)
            .await
        {
            warn!(agent_id, error = %e, "could not persist agent state");
        }
    }

    /// Builds and initializes a new client and spawns its event loop.
    ///
    /// Callers hold the agent's slot lock; the event loop takes the same
    /// lock before acting on terminal events, so it only runs them once
    /// the new client is registered.
    async fn launch(self: &Arc<Self>, agent_id: &str) -> Result<LiveClient, WagentError> {
        self.set_state(agent_id, ConnectionState::Initializing, None)
            .await;

        let dir = session_dir::session_dir(&self.sessions_root, agent_id);
        let ClientConnection { client, events } = self.factory.create(agent_id, &dir).await?;

        if let Err(e) = client.initialize().await {
            if let Err(destroy_err) = client.destroy().await {
                debug!(agent_id, error = %destroy_err, "destroy after failed initialize");
            }
            return Err(e);
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let stop = self.shutdown.child_token();
        tokio::spawn(run_events(
            self.clone(),
            agent_id.to_string(),
            generation,
            client.clone(),
            events,
            stop.clone(),
        ));
        debug!(agent_id, generation, "client launched");

        Ok(LiveClient {
            client,
            generation,
            stop,
        })
    }

    async fn teardown(&self, agent_id: &str, old: LiveClient) {
        old.stop.cancel();
        if let Err(e) = old.client.destroy().await {
            warn!(agent_id, generation = old.generation, error = %e, "client destroy failed");
        }
    }

    /// Pairing lost: wipe the session and relaunch for a new QR.
    async fn recover(self: &Arc<Self>, agent_id: &str, generation: u64, reason: String) {
        let slot = self.slot(agent_id);
        let mut live = slot.live.lock().await;
        let Some(old) = take_if_current(&mut live, generation) else {
            debug!(agent_id, generation, "stale client, recovery skipped");
            return;
        };

        warn!(agent_id, %reason, "session lost, re-pairing");
        self.set_state(agent_id, ConnectionState::Recovering, Some(reason))
            .await;
        self.teardown(agent_id, old).await;
        if let Err(e) = session_dir::wipe(&self.sessions_root, agent_id).await {
            warn!(agent_id, error = %e, "could not remove session directory");
        }
        self.set_state(agent_id, ConnectionState::RequestingQr, None)
            .await;

        match self.launch(agent_id).await {
            Ok(client) => *live = Some(client),
            Err(e) => {
                error!(agent_id, error = %e, "failed to recreate client");
                self.set_state(agent_id, ConnectionState::Disconnected, Some(e.to_string()))
                    .await;
            }
        }
    }

    /// Transient drop: detach the client and wait for an explicit start.
    async fn disconnect(&self, agent_id: &str, generation: u64, reason: String) {
        let slot = self.slot(agent_id);
        let mut live = slot.live.lock().await;
        let Some(old) = take_if_current(&mut live, generation) else {
            return;
        };
        self.teardown(agent_id, old).await;
        self.set_state(agent_id, ConnectionState::Disconnected, Some(reason))
            .await;
    }

    async fn on_ready(&self, agent_id: &str, client: &dyn ChatClient) {
        self.set_state(agent_id, ConnectionState::Connected, None)
            .await;
        match client.phone_number().await {
            Some(phone) => {
                if let Err(e) = self.store.set_agent_phone(agent_id, &phone).await {
                    warn!(agent_id, error = %e, "could not persist phone number");
                }
            }
            None => debug!(agent_id, "phone number not available"),
        }
    }
}

fn take_if_current(live: &mut Option<LiveClient>, generation: u64) -> Option<LiveClient> {
    if live.as_ref().map(|l| l.generation) == Some(generation) {
        live.take()
    } else {
        None
    }
}

type EventLoop = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Consumes one client's events until it stops or hits a terminal event.
///
/// Returning after the first terminal event guarantees disconnect and
/// auth-failure handling run at most once per client. Boxed because
/// recovery launches the next loop from inside this one.
fn run_events(
    inner: Arc<Inner>,
    agent_id: String,
    generation: u64,
    client: Arc<dyn ChatClient>,
    mut events: mpsc::Receiver<ClientEvent>,
    stop: CancellationToken,
) -> EventLoop {
    Box::pin(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            match event {
                ClientEvent::Qr(payload) => {
                    inner
                        .set_state(&agent_id, ConnectionState::RequestingQr, None)
                        .await;
                    match qr_data_url(&payload) {
                        Ok(data_url) => inner.status.emit(&agent_id, StatusEvent::Qr { data_url }),
                        Err(e) => warn!(agent_id = %agent_id, error = %e, "could not render QR code"),
                    }
                }
                ClientEvent::Authenticated => {
                    inner
                        .set_state(&agent_id, ConnectionState::Authenticated, None)
                        .await;
                }
                ClientEvent::Ready => inner.on_ready(&agent_id, client.as_ref()).await,
                ClientEvent::Message(message) => {
                    let inbound = inner.inbound.clone();
                    let client = client.clone();
                    let agent_id = agent_id.clone();
                    tokio::spawn(async move {
                        let message_id = message.id.clone();
                        match inbound.handle_inbound(&agent_id, client, message).await {
                            Ok(outcome) => debug!(
                                agent_id = %agent_id,
                                message_id = %message_id,
                                ?outcome,
                                "inbound handled"
                            ),
                            Err(e) => error!(
                                agent_id = %agent_id,
                                message_id = %message_id,
                                error = %e,
                                "inbound handling failed"
                            ),
                        }
                    });
                }
                ClientEvent::Error(message) => {
                    warn!(agent_id = %agent_id, error = %message, "chat client error");
                }
                ClientEvent::AuthFailure(message) => {
                    inner.status.emit(
                        &agent_id,
                        StatusEvent::Error {
                            message: "Auth failure".to_string(),
                        },
                    );
                    inner.recover(&agent_id, generation, message).await;
                    break;
                }
                ClientEvent::Disconnected(reason) => {
                    if is_logout_reason(&reason) {
                        inner.recover(&agent_id, generation, reason).await;
                    } else {
                        info!(agent_id = %agent_id, %reason, "client disconnected");
                        inner.disconnect(&agent_id, generation, reason).await;
                    }
                    break;
                }
            }
        }
        debug!(agent_id = %agent_id, generation, "event loop finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logout_reasons() {
        for reason in ["LOGOUT", "logout", "UNPAIRED_IDLE", "session invalid", "Revoked"] {
            assert!(is_logout_reason(reason), "{reason}");
        }
        for reason in ["NAVIGATION", "CONFLICT", "timeout"] {
            assert!(!is_logout_reason(reason), "{reason}");
        }
    }
}
