// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound de-duplication records.

use rusqlite::params;
use wagent_core::{DedupOutcome, InboundDedupRecord, WagentError};

use crate::database::{Database, map_tr_err};

/// Inserts the record unless the (agent, chat, message) triple exists.
///
/// The conflict clause only swallows the primary-key collision, so a
/// zero-row insert means "duplicate" and every other failure surfaces as
/// an error.
pub async fn record(db: &Database, rec: &InboundDedupRecord) -> Result<DedupOutcome, WagentError> {
    let rec = rec.clone();
    db.connection()
        .call(move |conn| -> rusqlite::Result<DedupOutcome> {
            let inserted = conn.execute(
                "INSERT INTO inbound_messages (agent_id, chat_id, unique_message_id, message_ts)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (agent_id, chat_id, unique_message_id) DO NOTHING",
                params![
                    rec.agent_id,
                    rec.chat_id,
                    rec.unique_message_id,
                    rec.timestamp_ms
                ],
            )?;
            Ok(if inserted == 0 {
                DedupOutcome::Duplicate
            } else {
                DedupOutcome::Inserted
            })
        })
        .await
        .map_err(map_tr_err)
}
