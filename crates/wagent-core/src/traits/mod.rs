// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits the agent runtime is written against.
//!
//! Network-facing traits use `#[async_trait]` so they can be held as
//! `Arc<dyn Trait>`.

pub mod adapter;
pub mod assistant;
pub mod chat;
pub mod ocr;
pub mod status;
pub mod store;

pub use adapter::PluginAdapter;
pub use assistant::{AssistantBackend, AssistantConnector, KeyResolver};
pub use chat::{ChatClient, ChatClientFactory, ClientConnection};
pub use ocr::TextExtractor;
pub use status::StatusSink;
pub use store::Store;
