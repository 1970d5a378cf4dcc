// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::WagentConfig;

/// Validates a deserialized configuration, collecting every failure.
pub fn validate_config(config: &WagentConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    for (key, value) in [
        ("storage.database_path", &config.storage.database_path),
        ("sessions.data_dir", &config.sessions.data_dir),
        ("openai.api_key_name", &config.openai.api_key_name),
    ] {
        if value.trim().is_empty() {
            fail(format!("{key} must not be empty"));
        }
    }

    if !has_scheme(&config.sessions.bridge_url, &["ws://", "wss://"]) {
        fail(format!(
            "sessions.bridge_url must be a ws:// or wss:// URL, got `{}`",
            config.sessions.bridge_url
        ));
    }

    if !has_scheme(&config.openai.base_url, &["http://", "https://"]) {
        fail(format!(
            "openai.base_url must be an http(s) URL, got `{}`",
            config.openai.base_url
        ));
    }

    if let Some(endpoint) = &config.ocr.endpoint
        && !has_scheme(endpoint, &["http://", "https://"])
    {
        fail(format!("ocr.endpoint must be an http(s) URL, got `{endpoint}`"));
    }

    if config.polling.interval_ms == 0 {
        fail("polling.interval_ms must be greater than 0".to_string());
    }
    if config.polling.max_attempts == 0 {
        fail("polling.max_attempts must be at least 1".to_string());
    }
    if config.ocr.timeout_secs == 0 {
        fail("ocr.timeout_secs must be greater than 0".to_string());
    }
    if config.status.channel_capacity == 0 {
        fail("status.channel_capacity must be greater than 0".to_string());
    }

    if config.vault.kdf_memory_cost < 32768 {
        fail(format!(
            "vault.kdf_memory_cost must be at least 32768 (32 MiB), got {}",
            config.vault.kdf_memory_cost
        ));
    }
    if config.vault.kdf_iterations < 2 {
        fail(format!(
            "vault.kdf_iterations must be at least 2, got {}",
            config.vault.kdf_iterations
        ));
    }
    if config.vault.kdf_parallelism < 1 {
        fail("vault.kdf_parallelism must be at least 1".to_string());
    }
    match hex::decode(&config.vault.salt) {
        Ok(bytes) if bytes.len() == 16 => {}
        _ => fail("vault.salt must be 32 hex characters (16 bytes)".to_string()),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&WagentConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_failures() {
        let mut config = WagentConfig::default();
        config.polling.interval_ms = 0;
        config.polling.max_attempts = 0;
        config.sessions.bridge_url = "http://bridge".into();
        config.vault.salt = "abcd".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
