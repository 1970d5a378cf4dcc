// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whitelist and blacklist entries.

use rusqlite::params;
use strum::{Display, EnumString};
use wagent_core::{PermissionEntry, PermissionLists, PermissionScope, WagentError};

use crate::database::{Database, map_tr_err};

/// Which of the two per-agent lists an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ListKind {
    Whitelist,
    Blacklist,
}

impl ListKind {
    fn other(self) -> Self {
        match self {
            Self::Whitelist => Self::Blacklist,
            Self::Blacklist => Self::Whitelist,
        }
    }
}

/// Adds an entry, removing the same identifier from the opposite list so
/// the two lists stay disjoint.
pub async fn add(
    db: &Database,
    agent_id: &str,
    list: ListKind,
    entry: &PermissionEntry,
) -> Result<(), WagentError> {
    let agent_id = agent_id.to_string();
    let entry = entry.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<()> {
            let tx = conn.transaction()?;
            tx.execute(
                "DELETE FROM permission_entries WHERE agent_id = ?1 AND list = ?2 AND identifier = ?3",
                params![agent_id, list.other().to_string(), entry.identifier],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO permission_entries (agent_id, list, scope, identifier)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    agent_id,
                    list.to_string(),
                    entry.scope.to_string(),
                    entry.identifier
                ],
            )?;
            tx.commit()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn remove(
    db: &Database,
    agent_id: &str,
    list: ListKind,
    identifier: &str,
) -> Result<bool, WagentError> {
    let (agent_id, identifier) = (agent_id.to_string(), identifier.to_string());
    db.connection()
        .call(move |conn| -> rusqlite::Result<bool> {
            let removed = conn.execute(
                "DELETE FROM permission_entries WHERE agent_id = ?1 AND list = ?2 AND identifier = ?3",
                params![agent_id, list.to_string(), identifier],
            )?;
            Ok(removed > 0)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn lists(db: &Database, agent_id: &str) -> Result<PermissionLists, WagentError> {
    let agent_id = agent_id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<PermissionLists> {
            let mut stmt = conn.prepare(
                "SELECT list, scope, identifier FROM permission_entries
                 WHERE agent_id = ?1 ORDER BY id ASC",
            )?;
            let mut rows = stmt.query(params![agent_id])?;
            let mut lists = PermissionLists::default();
            while let Some(row) = rows.next()? {
                let list: String = row.get(0)?;
                let scope: String = row.get(1)?;
                let scope = scope.parse::<PermissionScope>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                let entry = PermissionEntry::new(scope, row.get::<_, String>(2)?);
                match list.parse::<ListKind>() {
                    Ok(ListKind::Whitelist) => lists.whitelist.push(entry),
                    Ok(ListKind::Blacklist) => lists.blacklist.push(entry),
                    Err(e) => {
                        return Err(rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        ));
                    }
                }
            }
            Ok(lists)
        })
        .await
        .map_err(map_tr_err)
}
