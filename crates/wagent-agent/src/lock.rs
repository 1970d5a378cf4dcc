// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation mutual exclusion.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use wagent_core::ConversationKey;

/// Hands out one exclusive ticket per conversation key.
///
/// Waiters on the same key are served in FIFO order (tokio's mutex is
/// fair). Entries are created on first use and kept for the process
/// lifetime.
#[derive(Default)]
pub struct ConversationLock {
    locks: DashMap<ConversationKey, Arc<Mutex<()>>>,
}

impl ConversationLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, key: &ConversationKey) -> Arc<Mutex<()>> {
        // Clone out of the map so the shard guard is released before awaiting.
        self.locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Runs `f` while holding the key's lock, returning its output.
    pub async fn run_exclusive<F, Fut, T>(&self, key: &ConversationKey, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let lock = self.lock_for(key);
        let _guard = lock.lock_owned().await;
        f().await
    }

    /// Number of keys that have ever been locked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_never_overlaps() {
        let lock = Arc::new(ConversationLock::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let key = ConversationKey::new("a1", "c1");

        let mut handles = Vec::new();
        for _ in 0..16 {
            let (lock, active, peak, key) =
                (lock.clone(), active.clone(), peak.clone(), key.clone());
            handles.push(tokio::spawn(async move {
                lock.run_exclusive(&key, || async {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(2)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(lock.len(), 1);
    }

    #[tokio::test]
    async fn different_keys_run_concurrently() {
        let lock = Arc::new(ConversationLock::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let k1 = ConversationKey::new("a1", "c1");
        let k2 = ConversationKey::new("a1", "c2");

        let holder = {
            let lock = lock.clone();
            tokio::spawn(async move { lock.run_exclusive(&k1, || async { rx.await.ok() }).await })
        };
        tokio::task::yield_now().await;
        // Would deadlock if c2 waited on c1's lock.
        let out = lock.run_exclusive(&k2, || async { 42 }).await;
        assert_eq!(out, 42);
        tx.send(()).unwrap();
        holder.await.unwrap();
    }

    #[tokio::test]
    async fn returns_closure_output() {
        let lock = ConversationLock::new();
        let key = ConversationKey::new("a", "c");
        let out: Result<u8, &str> = lock.run_exclusive(&key, || async { Err("boom") }).await;
        assert_eq!(out, Err("boom"));
    }
}
