// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent runtime for wagent.
//!
//! Owns the WhatsApp session lifecycle of every agent, filters and
//! deduplicates inbound messages, serializes them per conversation, and
//! answers them through an assistant backend.

pub mod lifecycle;
pub mod lock;
pub mod permission;
pub mod pipeline;
pub mod poll;
pub mod prompt;
pub mod qr;
pub mod queue;
pub mod responder;
pub mod runtime;
pub mod session_dir;
pub mod shutdown;
pub mod threads;

pub use lifecycle::{SessionManager, is_logout_reason};
pub use lock::ConversationLock;
pub use pipeline::{InboundHandler, InboundOutcome, InboundPipeline};
pub use poll::RunPoller;
pub use queue::{MessageQueue, QueueHandler, QueuedMessage};
pub use responder::{AiResponder, InboundEnvelope};
pub use runtime::{AgentRuntime, RuntimeDeps, RuntimeSettings};
pub use shutdown::install_signal_handler;
pub use threads::ThreadMapper;
