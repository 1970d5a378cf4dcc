// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the wagent crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    ChatClient,
    Assistant,
    Ocr,
}

// --- Session lifecycle ---

/// Connection state of an agent's chat-client session.
///
/// `Recovering` is entered while a terminal event (auth failure, logout)
/// is tearing the client down and building a replacement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    RequestingQr,
    Initializing,
    Authenticated,
    Connected,
    Disconnected,
    Recovering,
}

/// Last known status of an agent, as reported by `get_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub state: ConnectionState,
    pub ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusSnapshot {
    pub fn now(state: ConnectionState, reason: Option<String>) -> Self {
        Self {
            state,
            ts: Utc::now(),
            reason,
        }
    }

    /// Status reported for agents that have never been started.
    pub fn unknown() -> Self {
        Self::now(ConnectionState::Disconnected, None)
    }
}

/// Event delivered to status observers, keyed by agent at the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum StatusEvent {
    Status(StatusSnapshot),
    Qr {
        #[serde(rename = "dataUrl")]
        data_url: String,
    },
    Error {
        message: String,
    },
}

/// A persisted agent record as the core sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    /// Assistant the agent's runs are started against.
    pub assistant_id: String,
    pub state: ConnectionState,
    pub last_state_change_at: Option<DateTime<Utc>>,
    pub phone_number: Option<String>,
}

// --- Permissions ---

/// Scope of a permission list entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionScope {
    Group,
    Contact,
    All,
}

/// One whitelist or blacklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub scope: PermissionScope,
    pub identifier: String,
}

impl PermissionEntry {
    pub fn new(scope: PermissionScope, identifier: impl Into<String>) -> Self {
        Self {
            scope,
            identifier: identifier.into(),
        }
    }
}

/// Both permission lists of one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionLists {
    pub whitelist: Vec<PermissionEntry>,
    pub blacklist: Vec<PermissionEntry>,
}

// --- Conversations ---

/// Identifies one conversation of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationKey {
    pub agent_id: String,
    pub chat_id: String,
}

impl ConversationKey {
    pub fn new(agent_id: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            chat_id: chat_id.into(),
        }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.agent_id, self.chat_id)
    }
}

/// De-duplication record written before a message is queued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundDedupRecord {
    pub agent_id: String,
    pub chat_id: String,
    pub unique_message_id: String,
    /// Arrival timestamp in milliseconds.
    pub timestamp_ms: i64,
}

/// Result of attempting to record an inbound delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupOutcome {
    Inserted,
    Duplicate,
}

/// A reply the agent sent, persisted for conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRecord {
    pub agent_id: String,
    pub chat_id: String,
    pub thread_id: String,
    pub sender: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// An inbound chat message delivered by the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Platform-unique serialized message id.
    pub id: String,
    pub chat_id: String,
    /// Sender address (`<number>@c.us`, or the group id for group messages).
    pub from: String,
    /// Actual author inside a group conversation.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    /// Platform timestamp in seconds.
    pub timestamp: i64,
    #[serde(default)]
    pub has_media: bool,
    #[serde(default)]
    pub from_me: bool,
}

impl ChatMessage {
    /// Sender recorded on outbound history rows.
    pub fn sender(&self) -> &str {
        self.author.as_deref().unwrap_or(&self.from)
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.saturating_mul(1000)
    }
}

/// A downloaded media attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
    pub filename: Option<String>,
}

/// Typed events produced by one chat-client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// A pairing QR string is available.
    Qr(String),
    Authenticated,
    Ready,
    AuthFailure(String),
    Disconnected(String),
    Message(ChatMessage),
    /// Non-fatal client error; logged only.
    Error(String),
}

// --- Assistant backend ---

/// Status of an asynchronous assistant run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Statuses that end polling with an error.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::Expired)
    }
}

/// Output format requested when starting a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// First content part of an assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentPart {
    Text(String),
    /// Non-textual part (image file, refusal, ...), identified by its type tag.
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn connection_state_uses_screaming_names() {
        assert_eq!(ConnectionState::RequestingQr.to_string(), "REQUESTING_QR");
        assert_eq!(
            ConnectionState::from_str("RECOVERING").unwrap(),
            ConnectionState::Recovering
        );
    }

    #[test]
    fn run_status_parses_unknown_values() {
        let s: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(s, RunStatus::InProgress);
        let s: RunStatus = serde_json::from_str("\"something_new\"").unwrap();
        assert_eq!(s, RunStatus::Unknown);
        assert!(RunStatus::Expired.is_failure());
        assert!(!RunStatus::RequiresAction.is_failure());
    }

    #[test]
    fn status_event_wire_shape() {
        let event = StatusEvent::Qr {
            data_url: "data:x".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "qr");
        assert_eq!(json["dataUrl"], "data:x");

        let snap = StatusSnapshot::now(ConnectionState::Connected, None);
        let json = serde_json::to_value(StatusEvent::Status(snap)).unwrap();
        assert_eq!(json["event"], "status");
        assert_eq!(json["state"], "CONNECTED");
        assert!(json.get("reason").is_none());
    }

    #[test]
    fn sender_prefers_group_author() {
        let mut msg = ChatMessage {
            id: "m".into(),
            chat_id: "g@g.us".into(),
            from: "g@g.us".into(),
            author: Some("15550001@c.us".into()),
            body: String::new(),
            timestamp: 7,
            has_media: false,
            from_me: false,
        };
        assert_eq!(msg.sender(), "15550001@c.us");
        assert_eq!(msg.timestamp_ms(), 7000);
        msg.author = None;
        assert_eq!(msg.sender(), "g@g.us");
    }
}
