// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent records.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};
use wagent_core::{AgentRecord, ConnectionState, WagentError};

use crate::database::{Database, map_tr_err};

const AGENT_COLUMNS: &str = "id, name, assistant_id, state, last_state_change_at, phone_number";

fn agent_from_row(row: &Row<'_>) -> rusqlite::Result<AgentRecord> {
    let state: String = row.get(3)?;
    let state = state.parse::<ConnectionState>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(AgentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        assistant_id: row.get(2)?,
        state,
        last_state_change_at: row.get(4)?,
        phone_number: row.get(5)?,
    })
}

pub async fn create_agent(
    db: &Database,
    id: &str,
    name: &str,
    assistant_id: &str,
) -> Result<(), WagentError> {
    let (id, name, assistant_id) = (id.to_string(), name.to_string(), assistant_id.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            conn.execute(
                "INSERT INTO agents (id, name, assistant_id) VALUES (?1, ?2, ?3)",
                params![id, name, assistant_id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_agent(db: &Database, id: &str) -> Result<Option<AgentRecord>, WagentError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Option<AgentRecord>> {
            conn.query_row(
                &format!("SELECT {AGENT_COLUMNS} FROM agents WHERE id = ?1"),
                params![id],
                agent_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_agents(db: &Database) -> Result<Vec<AgentRecord>, WagentError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<Vec<AgentRecord>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {AGENT_COLUMNS} FROM agents ORDER BY created_at ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], agent_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Writes the state snapshot. Unknown agents are ignored.
pub async fn update_state(
    db: &Database,
    id: &str,
    state: ConnectionState,
    at: DateTime<Utc>,
) -> Result<bool, WagentError> {
    let id = id.to_string();
    let state = state.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "UPDATE agents SET state = ?1, last_state_change_at = ?2 WHERE id = ?3",
                params![state, at, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn set_phone(db: &Database, id: &str, phone: &str) -> Result<bool, WagentError> {
    let (id, phone) = (id.to_string(), phone.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let changed = conn.execute(
                "UPDATE agents SET phone_number = ?1 WHERE id = ?2",
                params![phone, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn agent_exists(db: &Database, id: &str) -> Result<bool, WagentError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM agents WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
