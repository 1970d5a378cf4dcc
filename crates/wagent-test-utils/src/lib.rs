// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for wagent integration tests.
//!
//! In-memory and scripted stand-ins for every collaborator trait, so the
//! agent runtime can be exercised without SQLite, a bridge, or network
//! access.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory [`Store`](wagent_core::Store) with failure injection
//! - [`MockAssistant`] - Scripted assistant backend and connector
//! - [`MockChatClient`] / [`MockClientFactory`] - Call-recording chat clients with injectable events
//! - [`MockOcr`] - Canned text extraction
//! - [`RecordingSink`] - Captures status events

pub mod memory_store;
pub mod mock_assistant;
pub mod mock_chat;
pub mod mock_ocr;
pub mod recording_sink;

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

pub use memory_store::MemoryStore;
pub use mock_assistant::MockAssistant;
pub use mock_chat::{ClientCall, CreatedClient, MockChatClient, MockClientFactory};
pub use mock_ocr::MockOcr;
pub use recording_sink::RecordingSink;

/// Polls `condition` every 5ms until it holds or two seconds pass.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Locks `mutex`, ignoring poisoning from a panicked test thread.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
