// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the wagent service.
//!
//! Holds the error type, the domain types shared by every crate, and the
//! collaborator traits (store, chat client, assistant backend, OCR, status
//! sink) that the agent runtime is written against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{OcrErrorKind, WagentError};
pub use types::{
    AdapterType, AgentRecord, ChatMessage, ClientEvent, ContentPart, ConversationKey,
    ConnectionState, DedupOutcome, HealthStatus, InboundDedupRecord, MediaAttachment,
    OutboundRecord, PermissionEntry, PermissionLists, PermissionScope, ResponseFormat, RunStatus,
    StatusEvent, StatusSnapshot,
};

pub use traits::{
    AssistantBackend, AssistantConnector, ChatClient, ChatClientFactory, ClientConnection,
    KeyResolver, PluginAdapter, StatusSink, Store, TextExtractor,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_carries_context() {
        let err = WagentError::RunFailed {
            run_id: "run_1".into(),
            status: RunStatus::Expired,
        };
        assert_eq!(err.to_string(), "run run_1 ended with status expired");

        let err = WagentError::RunTimeout { attempts: 60 };
        assert!(err.to_string().contains("60"));

        let err = WagentError::Ocr {
            kind: OcrErrorKind::NoConfiguration,
            message: "no endpoint".into(),
        };
        assert_eq!(err.to_string(), "ocr error (no configuration): no endpoint");
    }

    #[test]
    fn ocr_timeout_is_classified() {
        let err = WagentError::ocr(OcrErrorKind::Timeout, "slow");
        assert!(matches!(
            err,
            WagentError::Ocr {
                kind: OcrErrorKind::Timeout,
                ..
            }
        ));
    }
}
