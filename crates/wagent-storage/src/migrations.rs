// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations (refinery).

use wagent_core::WagentError;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Applies pending migrations; history lives in `refinery_schema_history`.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), WagentError> {
    embedded::migrations::runner()
        .run(conn)
        .map_err(|e| WagentError::Storage {
            source: Box::new(e),
        })?;
    Ok(())
}
