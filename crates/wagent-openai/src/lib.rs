// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Assistants v2 backend.
//!
//! [`AssistantsClient`] speaks the threads/messages/runs endpoints for one
//! API key; [`OpenAiConnector`] builds one per agent from the key resolver.

pub mod client;
pub mod connector;
pub mod types;

pub use client::AssistantsClient;
pub use connector::OpenAiConnector;
