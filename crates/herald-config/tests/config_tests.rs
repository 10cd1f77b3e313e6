// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Herald configuration system.

use herald_config::diagnostic::ConfigError;
use herald_config::model::HeraldConfig;
use herald_config::{load_and_validate_str, load_config_from_str};
use herald_core::Channel;

/// Valid TOML with all known sections deserializes successfully.
#[test]
fn valid_toml_deserializes_into_herald_config() {
    let toml = r#"
log_level = "debug"

[processor]
batch_size = 50
send_timeout_secs = 10
concurrency = 4
poll_interval_secs = 30

[storage]
database_path = "/tmp/herald.db"
wal_mode = false

[server]
bind_address = "0.0.0.0"
port = 9000

[cascade.rich_message]
max_attempts = 4
escalation_delay_secs = 7200
retry_delays_secs = [60, 120]

[providers.rich_message]
api_key = "rk-123"
base_url = "https://rich.example.test"

[providers.voice_call]
api_key = "vk-123"
base_url = "https://voice.example.test"
active = false

[[identities]]
owner_id = "org-1"
channel = "rich_message"
sender_id = "+15550100"
webhook_url = "https://hooks.example.test/rich"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.processor.batch_size, 50);
    assert_eq!(config.processor.send_timeout_secs, 10);
    assert_eq!(config.processor.concurrency, 4);
    assert_eq!(config.storage.database_path, "/tmp/herald.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.cascade.rich_message.max_attempts, 4);
    assert_eq!(config.cascade.rich_message.retry_delays_secs, vec![60, 120]);
    // Sections not mentioned keep their defaults.
    assert_eq!(config.cascade.voice_call.max_attempts, 2);
    let rich = config.providers.rich_message.as_ref().unwrap();
    assert_eq!(rich.api_key.as_deref(), Some("rk-123"));
    assert!(rich.active);
    assert!(!config.providers.voice_call.as_ref().unwrap().active);
    assert!(config.providers.text_message.is_none());
    assert_eq!(config.identities.len(), 1);
    assert_eq!(config.identities[0].channel, Channel::RichMessage);
}

/// Empty TOML yields the compiled defaults.
#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    let defaults = HeraldConfig::default();
    assert_eq!(config.processor.batch_size, defaults.processor.batch_size);
    assert_eq!(config.processor.batch_size, 100);
    assert_eq!(config.cascade.rich_message, defaults.cascade.rich_message);
}

/// Unknown field in [processor] produces an error mentioning the key.
#[test]
fn unknown_field_in_processor_produces_error() {
    let toml = r#"
[processor]
batch_sise = 10
"#;

    let err = load_config_from_str(toml).expect_err("should reject unknown field");
    let err_str = format!("{err}");
    assert!(
        err_str.contains("unknown field") || err_str.contains("batch_sise"),
        "error should mention unknown field or the bad key, got: {err_str}"
    );
}

/// Unknown key converts into an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_key_diagnostic_suggests_correction() {
    let toml = r#"
[processor]
batch_sise = 10
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("batch_size"));
}

/// Unknown channel name in an identity is rejected at deserialization.
#[test]
fn unknown_identity_channel_is_rejected() {
    let toml = r#"
[[identities]]
owner_id = "org-1"
channel = "carrier_pigeon"
sender_id = "coop-7"
"#;

    assert!(load_config_from_str(toml).is_err());
}

/// Semantic validation errors surface through load_and_validate_str.
#[test]
fn semantic_errors_surface_as_validation_errors() {
    let toml = r#"
[cascade.text_message]
max_attempts = 0
escalation_delay_secs = 60
retry_delays_secs = []
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail validation");
    assert_eq!(errors.len(), 2, "got: {errors:?}");
    assert!(errors.iter().all(|e| matches!(e, ConfigError::Validation { .. })));
}

/// Wrong value type reports an InvalidType diagnostic.
#[test]
fn wrong_type_reports_invalid_type() {
    let toml = r#"
[processor]
batch_size = "lots"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("batch_size"))));
}

/// A misspelled channel table is reported as an unknown channel, located in
/// its header.
#[test]
fn misspelled_channel_table_is_an_unknown_channel() {
    let toml = r#"
[cascade.voice]
max_attempts = 2
escalation_delay_secs = 1800
retry_delays_secs = [600]
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    let (section, name, suggestion, span) = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownChannel {
                section,
                name,
                suggestion,
                span,
                ..
            } => Some((section.clone(), name.clone(), suggestion.clone(), *span)),
            _ => None,
        })
        .expect("an unknown channel diagnostic");
    assert_eq!(section, "cascade");
    assert_eq!(name, "voice");
    assert_eq!(suggestion.as_deref(), Some("voice_call"));
    let span = span.expect("header located");
    assert_eq!(&toml[span.offset()..span.offset() + span.len()], "voice");
}

/// An identity naming an unknown channel gets the channel diagnostic too.
#[test]
fn unknown_identity_channel_names_the_choices() {
    let toml = r#"
[[identities]]
owner_id = "org-1"
channel = "carrier_pigeon"
sender_id = "coop-7"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::UnknownChannel { section, name, .. }
            if section.starts_with("identities") && name == "carrier_pigeon"
    )));
}

/// An identity without a sender id is a missing key in that identity.
#[test]
fn identity_without_sender_reports_missing_key() {
    let toml = r#"
[[identities]]
owner_id = "org-1"
channel = "text_message"
"#;

    let errors = load_and_validate_str(toml).expect_err("should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::MissingKey { section, key }
            if section.starts_with("identities") && key == "sender_id"
    )));
}

/// A partial channel policy table keeps the built-in values it leaves out.
#[test]
fn partial_policy_table_merges_over_defaults() {
    let toml = r#"
[cascade.text_message]
max_attempts = 5
"#;

    let config = load_and_validate_str(toml).expect("valid");
    assert_eq!(config.cascade.text_message.max_attempts, 5);
    assert_eq!(
        config.cascade.text_message.retry_delays_secs,
        HeraldConfig::default().cascade.text_message.retry_delays_secs
    );
}

/// Validation errors carry the dotted key and the env var that overrides it.
#[test]
fn validation_errors_name_key_and_override() {
    let errors = load_and_validate_str("[processor]\nconcurrency = 0\n").expect_err("invalid");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::Validation { key, help, .. } => {
            assert_eq!(key, "processor.concurrency");
            assert_eq!(
                help.as_deref(),
                Some("set it in herald.toml or with HERALD_PROCESSOR_CONCURRENCY")
            );
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}
