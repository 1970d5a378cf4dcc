// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-agent session directories holding the chat client's pairing state.

use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Directory for `agent_id` under `root`: `<root>/session-<agent_id>`.
///
/// Bytes outside `[A-Za-z0-9-]` are written as `_xx` hex escapes, so an id
/// can never escape `root` and distinct ids never share a directory.
pub fn session_dir(root: &Path, agent_id: &str) -> PathBuf {
    let mut safe = String::with_capacity(agent_id.len());
    for b in agent_id.bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' {
            safe.push(char::from(b));
        } else {
            safe.push_str(&format!("_{b:02x}"));
        }
    }
    root.join(format!("session-{safe}"))
}

/// Whether pairing state exists on disk for the agent.
pub async fn has_saved_session(root: &Path, agent_id: &str) -> bool {
    tokio::fs::try_exists(session_dir(root, agent_id))
        .await
        .unwrap_or(false)
}

/// Removes the agent's session directory. A missing directory is fine.
pub async fn wipe(root: &Path, agent_id: &str) -> io::Result<()> {
    let dir = session_dir(root, agent_id);
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => {
            debug!(path = %dir.display(), "session directory removed");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_and_sanitizing() {
        let root = Path::new("/data");
        assert_eq!(session_dir(root, "agent-1"), PathBuf::from("/data/session-agent-1"));
        assert_eq!(
            session_dir(root, "../etc"),
            PathBuf::from("/data/session-_2e_2e_2fetc")
        );
    }

    #[test]
    fn similar_ids_get_distinct_directories() {
        let root = Path::new("/data");
        let ids = ["sales.bot", "sales_bot", "sales_2ebot", "sales bot", "sales-bot"];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(session_dir(root, a), session_dir(root, b), "{a} vs {b}");
            }
        }
    }

    #[tokio::test]
    async fn wipe_removes_and_tolerates_missing() {
        let root = tempfile::tempdir().unwrap();
        let dir = session_dir(root.path(), "a1");
        tokio::fs::create_dir_all(dir.join("Default")).await.unwrap();
        tokio::fs::write(dir.join("Default/state.json"), b"{}").await.unwrap();

        assert!(has_saved_session(root.path(), "a1").await);
        wipe(root.path(), "a1").await.unwrap();
        assert!(!has_saved_session(root.path(), "a1").await);
        wipe(root.path(), "a1").await.unwrap();
    }
}
