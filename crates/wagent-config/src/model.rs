// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model.
//!
//! Every section rejects unknown keys and every field has a default, so an
//! empty file is a valid configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WagentConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub status: StatusConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    /// Default tracing level; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "wagent".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "wagent.db".to_string()
}

fn default_true() -> bool {
    true
}

/// Chat-client sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionsConfig {
    /// Parent directory of the per-agent `session-<agent>` directories.
    #[serde(default = "default_sessions_dir")]
    pub data_dir: String,
    /// WebSocket endpoint of the WhatsApp-Web bridge.
    #[serde(default = "default_bridge_url")]
    pub bridge_url: String,
    #[serde(default = "default_bridge_timeout")]
    pub request_timeout_secs: u64,
    /// Start every stored agent when the service boots.
    #[serde(default = "default_true")]
    pub autostart: bool,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_sessions_dir(),
            bridge_url: default_bridge_url(),
            request_timeout_secs: default_bridge_timeout(),
            autostart: true,
        }
    }
}

fn default_sessions_dir() -> String {
    "./whatsapp_sessions".to_string()
}

fn default_bridge_url() -> String {
    "ws://127.0.0.1:8089/session".to_string()
}

fn default_bridge_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Name under which each agent's encrypted key is stored.
    #[serde(default = "default_api_key_name")]
    pub api_key_name: String,
    #[serde(default = "default_openai_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key_name: default_api_key_name(),
            request_timeout_secs: default_openai_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_name() -> String {
    "OPENAIAPIKEY".to_string()
}

fn default_openai_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    1
}

/// Run-status polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_ms: u64,
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval(),
            max_attempts: default_poll_attempts(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_poll_attempts() -> u32 {
    60
}

/// OCR extraction service. Missing endpoint or key disables extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OcrConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: default_ocr_timeout(),
        }
    }
}

fn default_ocr_timeout() -> u64 {
    50
}

/// Encryption of stored API keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Master secret; usually supplied as `WAGENT_VAULT_MASTER_KEY`.
    #[serde(default)]
    pub master_key: Option<String>,
    /// Hex-encoded 16-byte KDF salt.
    #[serde(default = "default_salt")]
    pub salt: String,
    /// Argon2id memory cost in KiB.
    #[serde(default = "default_kdf_memory")]
    pub kdf_memory_cost: u32,
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            master_key: None,
            salt: default_salt(),
            kdf_memory_cost: default_kdf_memory(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
        }
    }
}

fn default_salt() -> String {
    "7761676e742d6170692d6b6579730a01".to_string()
}

fn default_kdf_memory() -> u32 {
    65536
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

/// Status broadcasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_channel_capacity() -> usize {
    256
}
