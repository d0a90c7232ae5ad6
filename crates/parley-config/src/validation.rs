// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-empty identifiers,
//! positive limits, probabilities within range, a parseable default ignore
//! pattern.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Collects every failure instead of stopping at the first one.
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.bot.command_prefix.trim().is_empty() {
        fail("bot.command_prefix must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        fail(format!(
            "bot.log_level `{}` must be one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.model.default_model.trim().is_empty() {
        fail("model.default_model must not be empty".to_string());
    }

    if config.model.scan_images_model.trim().is_empty() {
        fail("model.scan_images_model must not be empty".to_string());
    }

    if config.context.backread_limit == 0 {
        fail("context.backread_limit must be at least 1".to_string());
    }

    if config.context.backread_seconds == 0 {
        fail("context.backread_seconds must be at least 1".to_string());
    }

    if config.context.ignore_regex_timeout_ms == 0 {
        fail("context.ignore_regex_timeout_ms must be at least 1".to_string());
    }

    if let Some(pattern) = &config.context.ignore_regex {
        if let Err(e) = regex::Regex::new(pattern) {
            fail(format!("context.ignore_regex is not a valid pattern: {e}"));
        }
    }

    let p = config.consent.notice_probability;
    if !(0.0..=1.0).contains(&p) {
        fail(format!(
            "consent.notice_probability must be between 0.0 and 1.0, got {p}"
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
