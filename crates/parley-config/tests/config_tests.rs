// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Parley configuration system.

use std::io::Write;

use parley_config::diagnostic::ConfigError;
use parley_config::model::{NoticePolicyKind, ParleyConfig, ScanImageMode};
use parley_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// A file with every section set deserializes field by field.
#[test]
fn full_toml_deserializes() {
    let toml = r#"
[bot]
name = "bugbot"
command_prefix = "?"
log_level = "debug"

[prompt]
system_prompt = "You are {botname}."

[model]
default_model = "openai/gpt-4-1106-preview"
scan_images_model = "gpt-4-vision-preview"
scan_images = true
scan_images_mode = "llm"

[context]
backread_limit = 30
backread_seconds = 600
image_token_cost = 300
max_reply_depth = 3
consent_scan_window = 0
ignore_regex = "^!"
ignore_regex_timeout_ms = 250

[consent]
opt_in_by_default = true
disable_notice = true
notice_policy = "never"
notice_probability = 0.5
notice_crowd_threshold = 5
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bot.name, "bugbot");
    assert_eq!(config.bot.command_prefix, "?");
    assert_eq!(config.prompt.system_prompt.as_deref(), Some("You are {botname}."));
    assert_eq!(config.model.default_model, "openai/gpt-4-1106-preview");
    assert!(config.model.scan_images);
    assert_eq!(config.model.scan_images_mode, ScanImageMode::Llm);
    assert_eq!(config.context.backread_limit, 30);
    assert_eq!(config.context.backread_seconds, 600);
    assert_eq!(config.context.image_token_cost, 300);
    assert_eq!(config.context.max_reply_depth, 3);
    assert_eq!(config.context.consent_scan_window, 0);
    assert_eq!(config.context.ignore_regex.as_deref(), Some("^!"));
    assert_eq!(config.context.ignore_regex_timeout_ms, 250);
    assert!(config.consent.opt_in_by_default);
    assert!(config.consent.disable_notice);
    assert_eq!(config.consent.notice_policy, NoticePolicyKind::Never);
    assert_eq!(config.consent.notice_crowd_threshold, 5);
}

/// Empty input falls back to compiled defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    let defaults = ParleyConfig::default();
    assert_eq!(config.bot.name, defaults.bot.name);
    assert_eq!(config.context.backread_limit, defaults.context.backread_limit);
    assert!(config.prompt.system_prompt.is_none());
    assert!(!config.consent.opt_in_by_default);
}

/// A misspelled key is reported with a suggestion.
#[test]
fn unknown_key_suggests_correction() {
    let toml = r#"
[context]
backread_limt = 5
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown key");
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { key, suggestion, .. } if key == "backread_limt" => {
            suggestion.clone()
        }
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("backread_limit"));
}

/// A wrongly typed value is an InvalidType diagnostic.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[context]
backread_limit = "many"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject string limit");
    assert!(errors
        .iter()
        .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("backread_limit"))));
}

/// Values that parse but violate semantics surface as validation errors.
#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[consent]
notice_probability = 2.0
"#;

    let errors = load_and_validate_str(toml).expect_err("probability out of range");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("notice_probability")));
}

/// Unknown keys in a real file carry a source span pointing at the key.
#[test]
fn file_errors_carry_source_span() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "[bot]\nnaem = \"x\"\n").unwrap();

    let errors = load_and_validate_path(file.path()).expect_err("unknown key");
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            span,
            ..
        } => {
            assert_eq!(key, "naem");
            assert_eq!(suggestion.as_deref(), Some("name"));
            assert!(span.is_some());
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}
