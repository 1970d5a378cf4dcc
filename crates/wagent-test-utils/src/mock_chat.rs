// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat clients for deterministic testing.
//!
//! `MockClientFactory` hands out `MockChatClient`s and keeps the sending
//! half of each client's event channel, so tests can inject QR, ready,
//! message, and disconnect events exactly as a real client would.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use wagent_core::{
    ChatClient, ChatClientFactory, ClientConnection, ClientEvent, MediaAttachment, WagentError,
};

use crate::lock;

/// One recorded call on a [`MockChatClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Initialize,
    Destroy,
    Seen(String),
    Typing(String),
    ClearState(String),
    Reply {
        chat_id: String,
        message_id: String,
        text: String,
    },
    DownloadMedia(String),
}

#[derive(Default)]
pub struct MockChatClient {
    calls: Mutex<Vec<ClientCall>>,
    media: Mutex<Option<MediaAttachment>>,
    phone: Mutex<Option<String>>,
    fail_initialize: AtomicBool,
    fail_replies: AtomicBool,
}

impl MockChatClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        lock(&self.calls).clone()
    }

    /// Texts of every reply, in order.
    pub fn replies(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                ClientCall::Reply { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn destroyed(&self) -> bool {
        lock(&self.calls).contains(&ClientCall::Destroy)
    }

    pub fn set_media(&self, media: MediaAttachment) {
        *lock(&self.media) = Some(media);
    }

    pub fn set_phone(&self, phone: &str) {
        *lock(&self.phone) = Some(phone.to_string());
    }

    pub fn fail_initialize(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }

    pub fn fail_replies(&self, fail: bool) {
        self.fail_replies.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: ClientCall) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn initialize(&self) -> Result<(), WagentError> {
        self.record(ClientCall::Initialize);
        if self.fail_initialize.load(Ordering::SeqCst) {
            return Err(WagentError::client("browser failed to launch"));
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), WagentError> {
        self.record(ClientCall::Destroy);
        Ok(())
    }

    async fn phone_number(&self) -> Option<String> {
        lock(&self.phone).clone()
    }

    async fn send_seen(&self, chat_id: &str) -> Result<(), WagentError> {
        self.record(ClientCall::Seen(chat_id.to_string()));
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), WagentError> {
        self.record(ClientCall::Typing(chat_id.to_string()));
        Ok(())
    }

    async fn clear_state(&self, chat_id: &str) -> Result<(), WagentError> {
        self.record(ClientCall::ClearState(chat_id.to_string()));
        Ok(())
    }

    async fn reply(&self, chat_id: &str, message_id: &str, text: &str) -> Result<(), WagentError> {
        if self.fail_replies.load(Ordering::SeqCst) {
            return Err(WagentError::client("reply rejected"));
        }
        self.record(ClientCall::Reply {
            chat_id: chat_id.to_string(),
            message_id: message_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn download_media(&self, message_id: &str) -> Result<Option<MediaAttachment>, WagentError> {
        self.record(ClientCall::DownloadMedia(message_id.to_string()));
        Ok(lock(&self.media).clone())
    }
}

/// A client handed out by [`MockClientFactory`].
#[derive(Clone)]
pub struct CreatedClient {
    pub agent_id: String,
    pub session_dir: PathBuf,
    pub client: Arc<MockChatClient>,
    pub events: mpsc::Sender<ClientEvent>,
}

impl CreatedClient {
    /// Delivers `event` as if the client had produced it.
    pub async fn emit(&self, event: ClientEvent) {
        // A closed channel means the event loop already finished.
        let _ = self.events.send(event).await;
    }
}

#[derive(Default)]
pub struct MockClientFactory {
    created: Mutex<Vec<CreatedClient>>,
    fail_create: AtomicBool,
    fail_initialize: AtomicBool,
    phone: Mutex<Option<String>>,
}

impl MockClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<CreatedClient> {
        lock(&self.created).clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.created).len()
    }

    pub fn last(&self) -> Option<CreatedClient> {
        lock(&self.created).last().cloned()
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    /// Clients created from now on fail to initialize.
    pub fn fail_initialize(&self, fail: bool) {
        self.fail_initialize.store(fail, Ordering::SeqCst);
    }

    /// Phone number reported by clients created from now on.
    pub fn set_phone(&self, phone: &str) {
        *lock(&self.phone) = Some(phone.to_string());
    }
}

#[async_trait]
impl ChatClientFactory for MockClientFactory {
    async fn create(
        &self,
        agent_id: &str,
        session_dir: &Path,
    ) -> Result<ClientConnection, WagentError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(WagentError::client("bridge unreachable"));
        }

        let client = Arc::new(MockChatClient::new());
        client.fail_initialize(self.fail_initialize.load(Ordering::SeqCst));
        if let Some(phone) = lock(&self.phone).clone() {
            client.set_phone(&phone);
        }

        let (tx, rx) = mpsc::channel(64);
        lock(&self.created).push(CreatedClient {
            agent_id: agent_id.to_string(),
            session_dir: session_dir.to_path_buf(),
            client: client.clone(),
            events: tx,
        });

        Ok(ClientConnection {
            client,
            events: rx,
        })
    }
}
