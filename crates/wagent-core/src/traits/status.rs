// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::types::StatusEvent;

/// Fire-and-forget delivery of lifecycle events to observers.
///
/// Implementations must not block; a dropped event is acceptable.
pub trait StatusSink: Send + Sync + 'static {
    fn emit(&self, agent_id: &str, event: StatusEvent);
}
