// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypted per-agent API keys. Values are stored as produced by the
//! key cipher; this module never sees plaintext.

use rusqlite::{OptionalExtension, params};
use wagent_core::WagentError;

use crate::database::{Database, map_tr_err};

pub async fn set(db: &Database, agent_id: &str, name: &str, encrypted: &str) -> Result<(), WagentError> {
    let (agent_id, name, encrypted) = (agent_id.to_string(), name.to_string(), encrypted.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO api_keys (agent_id, name, encrypted_key) VALUES (?1, ?2, ?3)
                 ON CONFLICT (agent_id, name) DO UPDATE SET
                     encrypted_key = excluded.encrypted_key,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![agent_id, name, encrypted],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, agent_id: &str, name: &str) -> Result<Option<String>, WagentError> {
    let (agent_id, name) = (agent_id.to_string(), name.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<String>> {
            conn.query_row(
                "SELECT encrypted_key FROM api_keys WHERE agent_id = ?1 AND name = ?2",
                params![agent_id, name],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
