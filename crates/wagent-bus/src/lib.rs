// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status broadcaster.
//!
//! Lifecycle, QR and error events are fanned out to every subscriber over a
//! bounded `tokio::sync::broadcast` channel. Publishing never blocks: with
//! no subscribers the event is dropped, and slow subscribers observe
//! `Lagged` and skip ahead. Observers key on the snapshot timestamp, so
//! missed or repeated frames are tolerated.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, trace};
use wagent_core::{StatusEvent, StatusSink};

/// A status event tagged with the agent it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStatusEvent {
    pub agent_id: String,
    #[serde(flatten)]
    pub event: StatusEvent,
}

impl AgentStatusEvent {
    /// Name of the wire channel this event is delivered on.
    pub fn channel(&self) -> &'static str {
        match self.event {
            StatusEvent::Status(_) => "wapp:status",
            StatusEvent::Qr { .. } => "wapp:qr",
            StatusEvent::Error { .. } => "wapp:error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusBus {
    tx: broadcast::Sender<AgentStatusEvent>,
}

impl StatusBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AgentStatusEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl StatusSink for StatusBus {
    fn emit(&self, agent_id: &str, event: StatusEvent) {
        let event = AgentStatusEvent {
            agent_id: agent_id.to_string(),
            event,
        };
        let channel = event.channel();
        match self.tx.send(event) {
            Ok(receivers) => debug!(agent_id, channel, receivers, "status event published"),
            Err(_) => trace!(agent_id, channel, "no status subscribers"),
        }
    }
}
