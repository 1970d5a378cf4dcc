// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound reply history.

use rusqlite::params;
use wagent_core::{OutboundRecord, WagentError};

use crate::database::{Database, map_tr_err};

/// Persists a reply. Returns the generated row id.
pub async fn insert(db: &Database, rec: &OutboundRecord) -> Result<String, WagentError> {
    let rec = rec.clone();
    let id = uuid::Uuid::new_v4().to_string();
    let row_id = id.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO message_chats (id, agent_id, chat_id, thread_id, sender, message, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    row_id,
                    rec.agent_id,
                    rec.chat_id,
                    rec.thread_id,
                    rec.sender,
                    rec.message,
                    rec.created_at
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(id)
}

/// Replies sent in one conversation, oldest first.
pub async fn conversation(
    db: &Database,
    agent_id: &str,
    chat_id: &str,
) -> Result<Vec<OutboundRecord>, WagentError> {
    let (agent_id, chat_id) = (agent_id.to_string(), chat_id.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<OutboundRecord>> {
            let mut stmt = conn.prepare(
                "SELECT agent_id, chat_id, thread_id, sender, message, created_at
                 FROM message_chats
                 WHERE agent_id = ?1 AND chat_id = ?2
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![agent_id, chat_id], |row| {
                Ok(OutboundRecord {
                    agent_id: row.get(0)?,
                    chat_id: row.get(1)?,
                    thread_id: row.get(2)?,
                    sender: row.get(3)?,
                    message: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
