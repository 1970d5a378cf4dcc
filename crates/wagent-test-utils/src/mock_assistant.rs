// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted assistant backend for deterministic testing.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use wagent_core::{
    AssistantBackend, AssistantConnector, ContentPart, ResponseFormat, RunStatus, WagentError,
};

use crate::lock;

#[derive(Default)]
struct Script {
    statuses: VecDeque<RunStatus>,
    reply: Option<ContentPart>,
    threads: HashSet<String>,
    posted: Vec<(String, String)>,
    runs: Vec<(String, ResponseFormat)>,
    create_delay: Option<Duration>,
}

#[derive(Default)]
struct Inner {
    script: Mutex<Script>,
    threads_created: AtomicUsize,
    status_checks: AtomicUsize,
    runs_started: AtomicUsize,
    fail_thread_checks: AtomicBool,
    fail_create_thread: AtomicBool,
    fail_post: AtomicBool,
}

/// Assistant backend driven by a status script.
///
/// `run_status` pops scripted statuses and reports `completed` once the
/// script is empty. Clones share state, and the mock is its own
/// [`AssistantConnector`].
#[derive(Clone, Default)]
pub struct MockAssistant {
    inner: Arc<Inner>,
}

impl MockAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = RunStatus>) {
        lock(&self.inner.script).statuses.extend(statuses);
    }

    pub fn set_reply(&self, part: ContentPart) {
        lock(&self.inner.script).reply = Some(part);
    }

    pub fn add_existing_thread(&self, thread_id: &str) {
        lock(&self.inner.script).threads.insert(thread_id.to_string());
    }

    pub fn set_create_delay(&self, delay: Duration) {
        lock(&self.inner.script).create_delay = Some(delay);
    }

    pub fn fail_thread_checks(&self, fail: bool) {
        self.inner.fail_thread_checks.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_thread(&self, fail: bool) {
        self.inner.fail_create_thread.store(fail, Ordering::SeqCst);
    }

    pub fn fail_post(&self, fail: bool) {
        self.inner.fail_post.store(fail, Ordering::SeqCst);
    }

    pub fn threads_created(&self) -> usize {
        self.inner.threads_created.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> usize {
        self.inner.status_checks.load(Ordering::SeqCst)
    }

    /// `(thread_id, content)` of every posted message, in order.
    pub fn posted_messages(&self) -> Vec<(String, String)> {
        lock(&self.inner.script).posted.clone()
    }

    /// `(assistant_id, format)` of every started run, in order.
    pub fn runs_created(&self) -> Vec<(String, ResponseFormat)> {
        lock(&self.inner.script).runs.clone()
    }
}

#[async_trait]
impl AssistantBackend for MockAssistant {
    async fn create_thread(&self) -> Result<String, WagentError> {
        let delay = lock(&self.inner.script).create_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.inner.fail_create_thread.load(Ordering::SeqCst) {
            return Err(WagentError::assistant("thread creation rejected"));
        }
        let n = self.inner.threads_created.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("thread_{n}");
        lock(&self.inner.script).threads.insert(id.clone());
        Ok(id)
    }

    async fn thread_exists(&self, thread_id: &str) -> Result<bool, WagentError> {
        if self.inner.fail_thread_checks.load(Ordering::SeqCst) {
            return Err(WagentError::assistant("thread lookup failed"));
        }
        Ok(lock(&self.inner.script).threads.contains(thread_id))
    }

    async fn post_message(&self, thread_id: &str, content: &str) -> Result<(), WagentError> {
        if self.inner.fail_post.load(Ordering::SeqCst) {
            return Err(WagentError::assistant("message rejected"));
        }
        lock(&self.inner.script)
            .posted
            .push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        assistant_id: &str,
        format: ResponseFormat,
    ) -> Result<String, WagentError> {
        lock(&self.inner.script)
            .runs
            .push((assistant_id.to_string(), format));
        let n = self.inner.runs_started.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("run_{n}"))
    }

    async fn run_status(&self, _thread_id: &str, _run_id: &str) -> Result<RunStatus, WagentError> {
        self.inner.status_checks.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.inner.script)
            .statuses
            .pop_front()
            .unwrap_or(RunStatus::Completed))
    }

    async fn latest_message(&self, _thread_id: &str) -> Result<Option<ContentPart>, WagentError> {
        Ok(lock(&self.inner.script).reply.clone())
    }
}

#[async_trait]
impl AssistantConnector for MockAssistant {
    async fn connect(&self, _agent_id: &str) -> Result<Arc<dyn AssistantBackend>, WagentError> {
        Ok(Arc::new(self.clone()))
    }
}
