// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM backend abstraction (threads, messages, runs).

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::error::WagentError;
use crate::types::{ContentPart, ResponseFormat, RunStatus};

/// Thread/run operations against one agent's assistant account.
#[async_trait]
pub trait AssistantBackend: Send + Sync + 'static {
    async fn create_thread(&self) -> Result<String, WagentError>;

    /// Whether the remote thread still exists. Errors other than a clean
    /// "not found" are returned as `Err`.
    async fn thread_exists(&self, thread_id: &str) -> Result<bool, WagentError>;

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), WagentError>;

    /// Starts a run and returns its id.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
        format: ResponseFormat,
    ) -> Result<String, WagentError>;

    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<RunStatus, WagentError>;

    /// First content part of the most recent thread message.
    async fn latest_message(&self, thread_id: &str) -> Result<Option<ContentPart>, WagentError>;
}

/// Produces a backend authenticated with a given agent's credentials.
#[async_trait]
pub trait AssistantConnector: Send + Sync + 'static {
    async fn connect(&self, agent_id: &str) -> Result<Arc<dyn AssistantBackend>, WagentError>;
}

/// Resolves and decrypts an agent's LLM API key.
#[async_trait]
pub trait KeyResolver: Send + Sync + 'static {
    async fn api_key(&self, agent_id: &str) -> Result<SecretString, WagentError>;
}
