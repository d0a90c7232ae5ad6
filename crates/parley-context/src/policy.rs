// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-request snapshot of the scoped settings thread assembly depends on.

use std::time::Duration;

use parley_config::model::{ParleyConfig, ScanImageMode};
use parley_core::error::ParleyError;
use parley_core::traits::SettingsStore;
use parley_core::types::{GuildId, Scope, SettingKey};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::ignore::IgnorePattern;

/// Reads a typed setting at one scope.
///
/// Store failures propagate. An explicit `null` is treated as unset; a value
/// of the wrong type is logged and treated as unset.
pub async fn read_setting<T: DeserializeOwned>(
    store: &dyn SettingsStore,
    scope: Scope,
    key: SettingKey,
) -> Result<Option<T>, ParleyError> {
    let Some(value) = store.get(scope, key).await? else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(typed) => Ok(Some(typed)),
        Err(e) => {
            warn!(%key, ?scope, error = %e, "mistyped setting value, using default");
            Ok(None)
        }
    }
}

/// Settings resolved for one guild (or a direct conversation).
///
/// Each value is taken from the guild scope, then the global scope, then the
/// process-wide configuration.
#[derive(Debug, Clone)]
pub struct GuildPolicy {
    pub model: String,
    pub scan_images_model: String,
    pub custom_token_limit: Option<usize>,
    pub backread_limit: usize,
    pub backread_seconds: u64,
    pub opt_in_by_default: bool,
    pub disable_notice: bool,
    pub ignore: Option<IgnorePattern>,
    pub scan_images: bool,
    pub scan_images_mode: ScanImageMode,
}

impl GuildPolicy {
    /// Policy built from configuration alone.
    pub fn from_config(config: &ParleyConfig) -> Self {
        Self {
            model: config.model.default_model.clone(),
            scan_images_model: config.model.scan_images_model.clone(),
            custom_token_limit: None,
            backread_limit: config.context.backread_limit,
            backread_seconds: config.context.backread_seconds,
            opt_in_by_default: config.consent.opt_in_by_default,
            disable_notice: config.consent.disable_notice,
            ignore: config
                .context
                .ignore_regex
                .as_deref()
                .and_then(|p| compile_ignore(p, config)),
            scan_images: config.model.scan_images,
            scan_images_mode: config.model.scan_images_mode,
        }
    }

    /// Resolves the policy for `guild` from the settings store.
    pub async fn resolve(
        store: &dyn SettingsStore,
        config: &ParleyConfig,
        guild: Option<GuildId>,
    ) -> Result<Self, ParleyError> {
        let reader = ScopedReader::new(store, guild);
        let mut policy = Self::from_config(config);

        if let Some(model) = reader.get(SettingKey::Model).await? {
            policy.model = model;
        }
        if let Some(model) = reader.get(SettingKey::ScanImagesModel).await? {
            policy.scan_images_model = model;
        }
        policy.custom_token_limit = reader.get(SettingKey::CustomModelTokensLimit).await?;
        if let Some(limit) = reader.get(SettingKey::MessagesBackread).await? {
            policy.backread_limit = limit;
        }
        if let Some(seconds) = reader.get(SettingKey::MessagesBackreadSeconds).await? {
            policy.backread_seconds = seconds;
        }
        if let Some(allow) = reader.get(SettingKey::OptinByDefault).await? {
            policy.opt_in_by_default = allow;
        }
        if let Some(disable) = reader.get(SettingKey::OptinDisableEmbed).await? {
            policy.disable_notice = disable;
        }
        if let Some(pattern) = reader.get::<String>(SettingKey::IgnoreRegex).await? {
            policy.ignore = if pattern.is_empty() {
                None
            } else {
                compile_ignore(&pattern, config)
            };
        }
        if let Some(scan) = reader.get(SettingKey::ScanImages).await? {
            policy.scan_images = scan;
        }
        if let Some(mode) = reader.get(SettingKey::ScanImagesMode).await? {
            policy.scan_images_mode = mode;
        }

        Ok(policy)
    }

    pub fn max_gap(&self) -> chrono::Duration {
        i64::try_from(self.backread_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

fn compile_ignore(pattern: &str, config: &ParleyConfig) -> Option<IgnorePattern> {
    IgnorePattern::compile(
        pattern,
        Duration::from_millis(config.context.ignore_regex_timeout_ms),
    )
}

/// Reads a key from the most specific scope that has it.
struct ScopedReader<'a> {
    store: &'a dyn SettingsStore,
    scopes: Vec<Scope>,
}

impl<'a> ScopedReader<'a> {
    fn new(store: &'a dyn SettingsStore, guild: Option<GuildId>) -> Self {
        let mut scopes = Vec::with_capacity(2);
        if let Some(guild) = guild {
            scopes.push(Scope::Guild(guild));
        }
        scopes.push(Scope::Global);
        Self { store, scopes }
    }

    async fn get<T: DeserializeOwned>(&self, key: SettingKey) -> Result<Option<T>, ParleyError> {
        for scope in &self.scopes {
            if let Some(value) = read_setting(self.store, *scope, key).await? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct MapStore(HashMap<(Scope, SettingKey), Value>);

    impl MapStore {
        fn with(mut self, scope: Scope, key: SettingKey, value: Value) -> Self {
            self.0.insert((scope, key), value);
            self
        }
    }

    #[async_trait]
    impl SettingsStore for MapStore {
        async fn get(&self, scope: Scope, key: SettingKey) -> Result<Option<Value>, ParleyError> {
            Ok(self.0.get(&(scope, key)).cloned())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SettingsStore for FailingStore {
        async fn get(&self, _: Scope, key: SettingKey) -> Result<Option<Value>, ParleyError> {
            Err(ParleyError::Settings {
                key: key.to_string(),
                source: "store offline".into(),
            })
        }
    }

    const GUILD: GuildId = GuildId(7);

    #[tokio::test]
    async fn guild_beats_global_beats_config() {
        let store = MapStore::default()
            .with(Scope::Global, SettingKey::Model, json!("gpt-4"))
            .with(Scope::Guild(GUILD), SettingKey::Model, json!("claude-2"))
            .with(Scope::Global, SettingKey::MessagesBackread, json!(25));
        let config = ParleyConfig::default();

        let policy = GuildPolicy::resolve(&store, &config, Some(GUILD)).await.unwrap();
        assert_eq!(policy.model, "claude-2");
        assert_eq!(policy.backread_limit, 25);
        assert_eq!(policy.backread_seconds, config.context.backread_seconds);

        let direct = GuildPolicy::resolve(&store, &config, None).await.unwrap();
        assert_eq!(direct.model, "gpt-4");
    }

    #[tokio::test]
    #[traced_test]
    async fn mistyped_value_falls_back_with_warning() {
        let store = MapStore::default()
            .with(Scope::Guild(GUILD), SettingKey::MessagesBackread, json!("lots"))
            .with(Scope::Guild(GUILD), SettingKey::CustomModelTokensLimit, Value::Null);
        let config = ParleyConfig::default();

        let policy = GuildPolicy::resolve(&store, &config, Some(GUILD)).await.unwrap();
        assert_eq!(policy.backread_limit, config.context.backread_limit);
        assert_eq!(policy.custom_token_limit, None);
        assert!(logs_contain("mistyped setting value"));
    }

    #[tokio::test]
    async fn enum_and_pattern_settings_parse() {
        let store = MapStore::default()
            .with(Scope::Guild(GUILD), SettingKey::ScanImages, json!(true))
            .with(Scope::Guild(GUILD), SettingKey::ScanImagesMode, json!("llm"))
            .with(Scope::Guild(GUILD), SettingKey::IgnoreRegex, json!("^\\$"))
            .with(Scope::Guild(GUILD), SettingKey::CustomModelTokensLimit, json!(900));

        let policy = GuildPolicy::resolve(&store, &ParleyConfig::default(), Some(GUILD))
            .await
            .unwrap();
        assert!(policy.scan_images);
        assert_eq!(policy.scan_images_mode, ScanImageMode::Llm);
        assert_eq!(policy.ignore.as_ref().map(IgnorePattern::as_str), Some("^\\$"));
        assert_eq!(policy.custom_token_limit, Some(900));
    }

    #[tokio::test]
    async fn malformed_guild_pattern_disables_ignore() {
        let store = MapStore::default().with(
            Scope::Guild(GUILD),
            SettingKey::IgnoreRegex,
            json!("(oops"),
        );
        let policy = GuildPolicy::resolve(&store, &ParleyConfig::default(), Some(GUILD))
            .await
            .unwrap();
        assert!(policy.ignore.is_none());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let err = GuildPolicy::resolve(&FailingStore, &ParleyConfig::default(), Some(GUILD))
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Settings { .. }));
    }
}
