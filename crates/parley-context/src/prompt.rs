// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt selection and template rendering.
//!
//! Prompts are looked up from the most specific scope to the least:
//! member, the author's roles in order, channel, guild, global store value,
//! the configured prompt (file, then inline), and finally [`DEFAULT_PROMPT`].
//! Empty values are treated as unset.

use parley_config::model::PromptConfig;
use parley_core::error::ParleyError;
use parley_core::traits::SettingsStore;
use parley_core::types::{BotIdentity, PlatformMessage, RoleId, Scope, SettingKey};
use tracing::{debug, info, warn};

use crate::policy::read_setting;

/// Prompt used when nothing else is configured.
pub const DEFAULT_PROMPT: &str = "You are a helpful assistant called {botname}. \
You can help me by answering my questions. You can also ask me questions.";

/// Where a selected prompt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptSource {
    Member,
    Role(RoleId),
    Channel,
    Guild,
    Global,
    Configured,
    Builtin,
}

/// A prompt before template rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedPrompt {
    pub text: String,
    pub source: PromptSource,
}

/// Resolves the system prompt for a triggering message.
#[derive(Debug, Clone, Default)]
pub struct PromptSelector {
    configured: Option<String>,
}

impl PromptSelector {
    /// Loads the configured prompt: file > inline.
    ///
    /// An unreadable or empty file falls back to the inline prompt.
    pub async fn load(config: &PromptConfig) -> Self {
        if let Some(ref path) = config.system_prompt_file {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => {
                    let trimmed = content.trim();
                    if !trimmed.is_empty() {
                        info!(path = path.as_str(), "loaded system prompt from file");
                        return Self {
                            configured: Some(trimmed.to_string()),
                        };
                    }
                }
                Err(e) => {
                    warn!(
                        path = path.as_str(),
                        error = %e,
                        "failed to read system prompt file, falling back"
                    );
                }
            }
        }

        Self {
            configured: config
                .system_prompt
                .clone()
                .filter(|prompt| !prompt.is_empty()),
        }
    }

    /// Walks the scope chain for `message`, returning the first prompt found.
    pub async fn select(
        &self,
        store: &dyn SettingsStore,
        message: &PlatformMessage,
    ) -> Result<SelectedPrompt, ParleyError> {
        for (scope, source) in candidate_scopes(message) {
            let value: Option<String> =
                read_setting(store, scope, SettingKey::CustomTextPrompt).await?;
            if let Some(text) = value.filter(|t| !t.is_empty()) {
                debug!(?source, "selected scoped system prompt");
                return Ok(SelectedPrompt { text, source });
            }
        }

        Ok(match &self.configured {
            Some(text) => SelectedPrompt {
                text: text.clone(),
                source: PromptSource::Configured,
            },
            None => SelectedPrompt {
                text: DEFAULT_PROMPT.to_string(),
                source: PromptSource::Builtin,
            },
        })
    }
}

fn candidate_scopes(message: &PlatformMessage) -> Vec<(Scope, PromptSource)> {
    let mut scopes = Vec::new();
    if let Some(guild) = message.guild_id {
        scopes.push((
            Scope::Member {
                guild,
                user: message.author.id,
            },
            PromptSource::Member,
        ));
        for role in &message.author.roles {
            scopes.push((Scope::Role(*role), PromptSource::Role(*role)));
        }
    }
    scopes.push((Scope::Channel(message.channel_id), PromptSource::Channel));
    if let Some(guild) = message.guild_id {
        scopes.push((Scope::Guild(guild), PromptSource::Guild));
    }
    scopes.push((Scope::Global, PromptSource::Global));
    scopes
}

/// Substitutes template variables in `prompt`.
///
/// Date and time values come from the triggering message timestamp (UTC).
pub fn render_template(prompt: &str, bot: &BotIdentity, message: &PlatformMessage) -> String {
    let at = message.created_at;
    let vars = [
        ("{botname}", bot.display_name.clone()),
        ("{authorname}", message.author.display_name.clone()),
        ("{authormention}", message.author.mention()),
        ("{servername}", message.guild_name.clone().unwrap_or_default()),
        ("{channelname}", message.channel_name.clone().unwrap_or_default()),
        ("{currentdate}", at.format("%Y/%m/%d").to_string()),
        ("{currentweekday}", at.format("%A").to_string()),
        ("{currenttime}", at.format("%H:%M").to_string()),
    ];

    let mut rendered = prompt.to_string();
    for (name, value) in vars {
        if rendered.contains(name) {
            rendered = rendered.replace(name, &value);
        }
    }
    rendered
}
