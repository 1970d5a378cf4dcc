// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the wagent service.

use thiserror::Error;

use crate::types::RunStatus;

/// Classifies failures reported by the OCR collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum OcrErrorKind {
    /// Endpoint, credentials, or caller-supplied phone number missing.
    #[strum(serialize = "no configuration")]
    NoConfiguration,
    /// The extraction service did not answer in time.
    #[strum(serialize = "timeout")]
    Timeout,
    /// The extraction service answered with an error or an unusable body.
    #[strum(serialize = "upstream")]
    Upstream,
}

/// The primary error type used across wagent crates.
#[derive(Debug, Error)]
pub enum WagentError {
    /// Configuration errors (invalid TOML, missing keys, missing credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable store errors (connection, query, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat client errors (bridge connection, send failure, media download).
    #[error("chat client error: {message}")]
    Client {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// LLM backend errors (HTTP failure, unexpected response shape).
    #[error("assistant error: {message}")]
    Assistant {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// OCR collaborator errors.
    #[error("ocr error ({kind}): {message}")]
    Ocr { kind: OcrErrorKind, message: String },

    /// A run reached a terminal non-success status.
    #[error("run {run_id} ended with status {status}")]
    RunFailed { run_id: String, status: RunStatus },

    /// A run did not complete within the polling budget.
    #[error("run did not complete after {attempts} status checks")]
    RunTimeout { attempts: u32 },

    /// The operation was abandoned because the process is shutting down.
    #[error("operation cancelled")]
    Cancelled,

    /// Secret handling errors (missing master key, decryption failure).
    #[error("vault error: {0}")]
    Vault(String),

    /// No agent record exists for the given identifier.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WagentError {
    /// Builds an [`WagentError::Ocr`] error.
    pub fn ocr(kind: OcrErrorKind, message: impl Into<String>) -> Self {
        Self::Ocr {
            kind,
            message: message.into(),
        }
    }

    /// Builds a [`WagentError::Client`] error without a source.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
            source: None,
        }
    }

    /// Builds a [`WagentError::Assistant`] error without a source.
    pub fn assistant(message: impl Into<String>) -> Self {
        Self::Assistant {
            message: message.into(),
            source: None,
        }
    }
}
