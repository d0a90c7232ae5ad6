// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Parley.
//!
//! These are the process-wide defaults. Per-guild, per-channel, per-role and
//! per-member values live in the settings store and take precedence at
//! request time. All structs use `#[serde(deny_unknown_fields)]` so typos are
//! reported at startup.

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Process-wide system prompt.
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Default chat and vision models.
    #[serde(default)]
    pub model: ModelConfig,

    /// History backread and thread assembly limits.
    #[serde(default)]
    pub context: ContextConfig,

    /// Opt-in defaults and consent notice behavior.
    #[serde(default)]
    pub consent: ConsentConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name used when the platform does not supply one.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Command prefix substituted into the consent notice.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            command_prefix: default_command_prefix(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "parley".to_string()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Process-wide system prompt, used when no scoped prompt is configured.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PromptConfig {
    /// Inline prompt text.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a file containing the prompt. Takes precedence over
    /// `system_prompt` if both are set.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

/// How attached images are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanImageMode {
    /// Captioned by a local pipeline before assembly.
    #[default]
    Local,
    /// Handed to a vision-capable chat model.
    Llm,
}

/// Model selection defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Chat completion model used when a guild has none configured.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Vision-capable model switched to when a trigger carries an image.
    #[serde(default = "default_scan_images_model")]
    pub scan_images_model: String,

    /// Whether image scanning is enabled by default.
    #[serde(default)]
    pub scan_images: bool,

    /// Default image scanning mode.
    #[serde(default)]
    pub scan_images_mode: ScanImageMode,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            scan_images_model: default_scan_images_model(),
            scan_images: false,
            scan_images_mode: ScanImageMode::default(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_scan_images_model() -> String {
    "gpt-4-vision-preview".to_string()
}

/// Thread assembly configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Maximum number of prior messages fetched per thread.
    #[serde(default = "default_backread_limit")]
    pub backread_limit: usize,

    /// Maximum gap in seconds between consecutive messages in a thread.
    #[serde(default = "default_backread_seconds")]
    pub backread_seconds: u64,

    /// Fixed token charge per image part.
    #[serde(default = "default_image_token_cost")]
    pub image_token_cost: usize,

    /// Maximum reply-chain expansion depth. 0 disables expansion.
    #[serde(default = "default_max_reply_depth")]
    pub max_reply_depth: usize,

    /// Number of newest fetched messages scanned for unopted authors.
    /// 0 scans every fetched message.
    #[serde(default = "default_consent_scan_window")]
    pub consent_scan_window: usize,

    /// Default ignore pattern; messages matching it are left out of threads.
    #[serde(default)]
    pub ignore_regex: Option<String>,

    /// Upper bound on a single ignore-pattern evaluation, in milliseconds.
    #[serde(default = "default_ignore_regex_timeout_ms")]
    pub ignore_regex_timeout_ms: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backread_limit: default_backread_limit(),
            backread_seconds: default_backread_seconds(),
            image_token_cost: default_image_token_cost(),
            max_reply_depth: default_max_reply_depth(),
            consent_scan_window: default_consent_scan_window(),
            ignore_regex: None,
            ignore_regex_timeout_ms: default_ignore_regex_timeout_ms(),
        }
    }
}

fn default_backread_limit() -> usize {
    10
}

fn default_backread_seconds() -> u64 {
    60 * 120
}

fn default_image_token_cost() -> usize {
    255
}

fn default_max_reply_depth() -> usize {
    8
}

fn default_consent_scan_window() -> usize {
    10
}

fn default_ignore_regex_timeout_ms() -> u64 {
    500
}

/// When the consent notice is posted after unopted users are detected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticePolicyKind {
    /// Every qualifying thread.
    Always,
    /// With `notice_probability`, or always above `notice_crowd_threshold` users.
    #[default]
    Damped,
    /// Never.
    Never,
}

/// Consent configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConsentConfig {
    /// Include users who have neither opted in nor out.
    #[serde(default)]
    pub opt_in_by_default: bool,

    /// Suppress the consent notice entirely.
    #[serde(default)]
    pub disable_notice: bool,

    /// Notice posting policy.
    #[serde(default)]
    pub notice_policy: NoticePolicyKind,

    /// Probability of posting under the damped policy (0.0-1.0).
    #[serde(default = "default_notice_probability")]
    pub notice_probability: f64,

    /// Under the damped policy, more unopted users than this always posts.
    #[serde(default = "default_notice_crowd_threshold")]
    pub notice_crowd_threshold: usize,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            opt_in_by_default: false,
            disable_notice: false,
            notice_policy: NoticePolicyKind::default(),
            notice_probability: default_notice_probability(),
            notice_crowd_threshold: default_notice_crowd_threshold(),
        }
    }
}

fn default_notice_probability() -> f64 {
    0.33
}

fn default_notice_crowd_threshold() -> usize {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ParleyConfig::default();
        assert_eq!(config.bot.name, "parley");
        assert_eq!(config.model.default_model, "gpt-3.5-turbo");
        assert_eq!(config.context.backread_limit, 10);
        assert_eq!(config.context.backread_seconds, 7200);
        assert_eq!(config.context.image_token_cost, 255);
        assert_eq!(config.consent.notice_policy, NoticePolicyKind::Damped);
        assert!((config.consent.notice_probability - 0.33).abs() < f64::EPSILON);
        assert_eq!(config.consent.notice_crowd_threshold, 3);
    }

    #[test]
    fn enums_parse_lowercase() {
        let toml_str = r#"
[model]
scan_images = true
scan_images_mode = "llm"

[consent]
notice_policy = "always"
"#;
        let config: ParleyConfig = toml::from_str(toml_str).unwrap();
        assert!(config.model.scan_images);
        assert_eq!(config.model.scan_images_mode, ScanImageMode::Llm);
        assert_eq!(config.consent.notice_policy, NoticePolicyKind::Always);
    }

    #[test]
    fn unknown_notice_policy_is_rejected() {
        let toml_str = r#"
[consent]
notice_policy = "sometimes"
"#;
        assert!(toml::from_str::<ParleyConfig>(toml_str).is_err());
    }
}
