// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley replay`: assembles a thread from a recorded JSON transcript.
//!
//! A transcript captures everything the builder would otherwise ask the
//! platform and stores for: channel history, scoped settings, consent sets and
//! the access deny list. Notices the builder posts are collected and printed
//! alongside the payload.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use parley_config::model::ParleyConfig;
use parley_context::{Collaborators, OverrideWindow, PayloadMessage, RequestContext, ThreadBuilder};
use parley_core::error::ParleyError;
use parley_core::traits::{AccessPolicy, ConsentStore, HistorySource, NoticeSink, SettingsStore};
use parley_core::types::{
    Author, BotIdentity, ChannelId, ConsentSets, EntryContent, HistoryQuery, MessageId, Notice,
    PlatformMessage, Scope, SettingKey, UserId,
};

/// A recorded request.
#[derive(Debug, Clone, Deserialize)]
pub struct Transcript {
    pub bot: BotIdentity,
    pub trigger: PlatformMessage,
    #[serde(default)]
    pub history: Vec<PlatformMessage>,
    #[serde(default)]
    pub settings: Vec<SettingRecord>,
    #[serde(default)]
    pub consent: ConsentSets,
    #[serde(default)]
    pub denied: HashSet<UserId>,
    #[serde(default)]
    pub prompt_override: Option<String>,
    #[serde(default)]
    pub override_window: Option<WindowRecord>,
    #[serde(default)]
    pub cached: HashMap<MessageId, EntryContent>,
}

/// One stored setting value.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingRecord {
    pub scope: Scope,
    pub key: SettingKey,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WindowRecord {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub inclusive: bool,
}

/// What `replay` prints.
#[derive(Debug, Serialize)]
pub struct ReplayOutput {
    pub model: String,
    pub budget: usize,
    pub tokens: usize,
    pub messages: Vec<PayloadMessage>,
    pub notices: Vec<Notice>,
}

/// Serves a transcript through the collaborator traits.
struct TranscriptPlatform {
    history: Vec<PlatformMessage>,
    settings: HashMap<(Scope, SettingKey), serde_json::Value>,
    consent: ConsentSets,
    denied: HashSet<UserId>,
    notices: Mutex<Vec<Notice>>,
}

#[async_trait]
impl HistorySource for TranscriptPlatform {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<PlatformMessage>, ParleyError> {
        let mut page: Vec<PlatformMessage> = self
            .history
            .iter()
            .filter(|m| m.channel_id == query.channel && m.id != query.before)
            .filter(|m| m.created_at <= query.before_time)
            .filter(|m| query.after.is_none_or(|after| m.created_at > after))
            .cloned()
            .collect();
        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        page.truncate(query.limit);
        if !query.newest_first {
            page.reverse();
        }
        Ok(page)
    }

    async fn resolve_reference(
        &self,
        message: &PlatformMessage,
    ) -> Result<Option<PlatformMessage>, ParleyError> {
        let Some(ref reference) = message.reference else {
            return Ok(None);
        };
        Ok(self
            .history
            .iter()
            .find(|m| m.id == reference.message_id)
            .cloned())
    }
}

#[async_trait]
impl SettingsStore for TranscriptPlatform {
    async fn get(
        &self,
        scope: Scope,
        key: SettingKey,
    ) -> Result<Option<serde_json::Value>, ParleyError> {
        Ok(self.settings.get(&(scope, key)).cloned())
    }
}

#[async_trait]
impl ConsentStore for TranscriptPlatform {
    async fn consent_sets(&self) -> Result<ConsentSets, ParleyError> {
        Ok(self.consent.clone())
    }
}

#[async_trait]
impl AccessPolicy for TranscriptPlatform {
    async fn allows(&self, author: &Author) -> Result<bool, ParleyError> {
        Ok(!self.denied.contains(&author.id))
    }
}

#[async_trait]
impl NoticeSink for TranscriptPlatform {
    async fn send_notice(&self, _channel: ChannelId, notice: &Notice) -> Result<(), ParleyError> {
        self.notices.lock().await.push(notice.clone());
        Ok(())
    }
}

/// Reads and parses a transcript file.
pub async fn load_transcript(path: &Path) -> Result<Transcript, ParleyError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ParleyError::Platform {
            message: format!("failed to read transcript {}", path.display()),
            source: Some(Box::new(e)),
        })?;
    parse_transcript(&content)
}

pub fn parse_transcript(content: &str) -> Result<Transcript, ParleyError> {
    serde_json::from_str(content).map_err(|e| ParleyError::Platform {
        message: "malformed transcript".to_string(),
        source: Some(Box::new(e)),
    })
}

/// Assembles the transcript's thread under `config`.
pub async fn replay(config: ParleyConfig, transcript: Transcript) -> Result<ReplayOutput, ParleyError> {
    let platform = Arc::new(TranscriptPlatform {
        history: transcript.history,
        settings: transcript
            .settings
            .into_iter()
            .map(|s| ((s.scope, s.key), s.value))
            .collect(),
        consent: transcript.consent,
        denied: transcript.denied,
        notices: Mutex::new(Vec::new()),
    });
    let collaborators = Collaborators {
        history: platform.clone(),
        settings: platform.clone(),
        consent: platform.clone(),
        access: platform.clone(),
        notices: platform.clone(),
    };

    let builder = ThreadBuilder::new(config, transcript.bot, collaborators).await;
    let ctx = RequestContext {
        override_window: transcript.override_window.map(|w| OverrideWindow {
            start: w.start,
            inclusive: w.inclusive,
        }),
        cached: transcript.cached,
    };
    let thread = builder
        .build_thread(&transcript.trigger, transcript.prompt_override.as_deref(), ctx)
        .await?;
    info!(entries = thread.len(), "replay complete");

    let notices = platform.notices.lock().await.clone();
    Ok(ReplayOutput {
        model: thread.model().to_string(),
        budget: thread.budget(),
        tokens: thread.tokens(),
        messages: thread.as_payload(),
        notices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_config::model::NoticePolicyKind;
    use parley_core::types::Role;

    const SAMPLE: &str = include_str!("../tests/fixtures/transcript.json");

    #[test]
    fn sample_transcript_parses() {
        let transcript = parse_transcript(SAMPLE).unwrap();
        assert_eq!(transcript.bot.display_name, "bugbot");
        assert_eq!(transcript.history.len(), 4);
        assert_eq!(transcript.settings.len(), 2);
        assert!(transcript.consent.opt_out.contains(&UserId(11)));
    }

    #[tokio::test]
    async fn sample_transcript_replays() {
        let mut config = ParleyConfig::default();
        config.consent.notice_policy = NoticePolicyKind::Always;

        let output = replay(config, parse_transcript(SAMPLE).unwrap()).await.unwrap();
        assert_eq!(output.model, "gpt-4");
        assert_eq!(output.budget, 7000);

        let roles: Vec<Role> = output.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, [Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(
            output.messages[0].content,
            EntryContent::Text("You are bugbot, chatting in #general.".into())
        );
        assert_eq!(output.notices.len(), 1);
        assert_eq!(output.notices[0].mentions, vec![UserId(12)]);
    }

    #[test]
    fn malformed_transcript_is_a_platform_error() {
        let err = parse_transcript("{\"bot\": 3}").unwrap_err();
        assert!(matches!(err, ParleyError::Platform { .. }));
    }
}
