// SPDX-FileCopyrightText: 2026 Wagent Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use wagent_config::{ConfigError, load_and_validate_str};

#[test]
fn empty_config_uses_defaults() {
    let config = load_and_validate_str("").unwrap();
    assert_eq!(config.polling.interval_ms, 1000);
    assert_eq!(config.polling.max_attempts, 60);
    assert_eq!(config.ocr.timeout_secs, 50);
    assert_eq!(config.openai.api_key_name, "OPENAIAPIKEY");
    assert_eq!(config.sessions.data_dir, "./whatsapp_sessions");
    assert!(config.ocr.endpoint.is_none());
}

#[test]
fn sections_override_defaults() {
    let config = load_and_validate_str(
        r#"
[sessions]
data_dir = "/var/lib/wagent/sessions"
autostart = false

[ocr]
endpoint = "https://ocr.example/extract"
api_key = "k"
"#,
    )
    .unwrap();
    assert_eq!(config.sessions.data_dir, "/var/lib/wagent/sessions");
    assert!(!config.sessions.autostart);
    assert_eq!(config.ocr.api_key.as_deref(), Some("k"));
}

#[test]
fn unknown_key_gets_suggestion() {
    let errors = load_and_validate_str("[polling]\nmax_atempts = 3\n").unwrap_err();
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_atempts");
            assert_eq!(suggestion.as_deref(), Some("max_attempts"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[polling]\ninterval_ms = \"fast\"\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_validation_runs_after_parse() {
    let errors = load_and_validate_str("[polling]\nmax_attempts = 0\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}
