// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-client abstraction.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::WagentError;
use crate::types::{ClientEvent, MediaAttachment};

/// One connected chat-client instance bound to one agent session.
#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// Starts the connection. Events flow on the channel returned by the
    /// factory alongside this client.
    async fn initialize(&self) -> Result<(), WagentError>;

    /// Tears the connection down. Safe to call more than once.
    async fn destroy(&self) -> Result<(), WagentError>;

    /// Phone number of the paired account, once known.
    async fn phone_number(&self) -> Option<String>;

    async fn send_seen(&self, chat_id: &str) -> Result<(), WagentError>;

    async fn send_typing(&self, chat_id: &str) -> Result<(), WagentError>;

    async fn clear_state(&self, chat_id: &str) -> Result<(), WagentError>;

    /// Replies in `chat_id`, quoting `message_id`.
    async fn reply(&self, chat_id: &str, message_id: &str, text: &str)
    -> Result<(), WagentError>;

    async fn download_media(&self, message_id: &str)
    -> Result<Option<MediaAttachment>, WagentError>;
}

/// A freshly built client together with its event stream.
pub struct ClientConnection {
    pub client: Arc<dyn ChatClient>,
    pub events: mpsc::Receiver<ClientEvent>,
}

/// Builds chat clients bound to a per-agent session directory.
#[async_trait]
pub trait ChatClientFactory: Send + Sync + 'static {
    async fn create(
        &self,
        agent_id: &str,
        session_dir: &Path,
    ) -> Result<ClientConnection, WagentError>;
}
