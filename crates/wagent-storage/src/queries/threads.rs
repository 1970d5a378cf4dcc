// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation to LLM thread mapping.

use rusqlite::{OptionalExtension, params};
use wagent_core::WagentError;

use crate::database::{Database, map_tr_err};

pub async fn find(db: &Database, agent_id: &str, chat_id: &str) -> Result<Option<String>, WagentError> {
    let (agent_id, chat_id) = (agent_id.to_string(), chat_id.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<String>> {
            conn.query_row(
                "SELECT thread_id FROM chat_thread_map WHERE agent_id = ?1 AND chat_id = ?2",
                params![agent_id, chat_id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn upsert(
    db: &Database,
    agent_id: &str,
    chat_id: &str,
    thread_id: &str,
) -> Result<(), WagentError> {
    let (agent_id, chat_id, thread_id) =
        (agent_id.to_string(), chat_id.to_string(), thread_id.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO chat_thread_map (agent_id, chat_id, thread_id)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT (agent_id, chat_id) DO UPDATE SET
                     thread_id = excluded.thread_id,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![agent_id, chat_id, thread_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
