// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite durable store for the wagent service.
//!
//! WAL-mode SQLite with embedded migrations. All statements run on
//! tokio-rusqlite's single background thread, so writes are serialized.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStore;
pub use database::Database;
