// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp chat client backed by a WhatsApp-Web bridge process.
//!
//! Each agent session opens its own WebSocket to the bridge. Requests carry
//! a numeric id and are answered by a `response` frame with the same id;
//! client events (`qr`, `ready`, `message`, ...) arrive as `event` frames and
//! are forwarded as typed [`wagent_core::ClientEvent`]s.

pub mod client;
pub mod factory;
pub mod protocol;

pub use client::BridgeClient;
pub use factory::BridgeClientFactory;
