// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Mutex;

use wagent_core::{ConnectionState, StatusEvent, StatusSink};

use crate::lock;

/// Status sink that keeps every event for assertions.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, StatusEvent)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(String, StatusEvent)> {
        lock(&self.events).clone()
    }

    /// State transitions emitted for `agent_id`, in order.
    pub fn states(&self, agent_id: &str) -> Vec<ConnectionState> {
        lock(&self.events)
            .iter()
            .filter(|(id, _)| id == agent_id)
            .filter_map(|(_, event)| match event {
                StatusEvent::Status(snapshot) => Some(snapshot.state),
                _ => None,
            })
            .collect()
    }

    pub fn qr_codes(&self, agent_id: &str) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter(|(id, _)| id == agent_id)
            .filter_map(|(_, event)| match event {
                StatusEvent::Qr { data_url } => Some(data_url.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self, agent_id: &str) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter(|(id, _)| id == agent_id)
            .filter_map(|(_, event)| match event {
                StatusEvent::Error { message } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl StatusSink for RecordingSink {
    fn emit(&self, agent_id: &str, event: StatusEvent) {
        lock(&self.events).push((agent_id.to_string(), event));
    }
}
