// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opt-in / opt-out gating and the consent notice.

use std::collections::BTreeMap;

use parley_config::model::{ConsentConfig, NoticePolicyKind};
use parley_core::traits::NoticeSink;
use parley_core::types::{Author, ChannelId, ConsentSets, Notice, PlatformMessage, UserId};
use rand::Rng;
use tracing::{debug, info, warn};

/// Title of the consent notice. Bot messages carrying it are never fed back
/// into a thread.
pub const OPTIN_NOTICE_TITLE: &str = ":information_source: AI User Opt-In / Opt-Out";

/// Snapshot of consent state for one guild.
#[derive(Debug, Clone, Default)]
pub struct ConsentRegistry {
    sets: ConsentSets,
    opt_in_by_default: bool,
}

impl ConsentRegistry {
    pub fn new(sets: ConsentSets, opt_in_by_default: bool) -> Self {
        let conflicting = sets.opt_in.intersection(&sets.opt_out).count();
        if conflicting > 0 {
            warn!(conflicting, "users present in both opt-in and opt-out; treating as opted out");
        }
        Self {
            sets,
            opt_in_by_default,
        }
    }

    pub fn is_opted_out(&self, user: UserId) -> bool {
        self.sets.opt_out.contains(&user)
    }

    /// Opted in and not also opted out.
    pub fn is_opted_in(&self, user: UserId) -> bool {
        self.sets.opt_in.contains(&user) && !self.is_opted_out(user)
    }

    /// Whether messages by `author` may enter a thread assembled for `bot`.
    ///
    /// Opt-out always excludes. Otherwise the bot itself, opted-in users, and
    /// everyone in a default-allow guild are permitted.
    pub fn permits(&self, author: UserId, bot: UserId) -> bool {
        if self.is_opted_out(author) {
            return false;
        }
        author == bot || self.is_opted_in(author) || self.opt_in_by_default
    }

    /// Human author who has made no choice either way.
    pub fn is_unopted(&self, author: &Author) -> bool {
        !author.bot && !self.sets.opt_in.contains(&author.id) && !self.is_opted_out(author.id)
    }

    /// Distinct unopted authors among `messages`, ordered by user id.
    ///
    /// Empty when the guild allows everyone by default.
    pub fn unopted_authors<'a>(
        &self,
        messages: impl IntoIterator<Item = &'a PlatformMessage>,
    ) -> Vec<Author> {
        if self.opt_in_by_default {
            return Vec::new();
        }
        let mut found = BTreeMap::new();
        for message in messages {
            if self.is_unopted(&message.author) {
                found
                    .entry(message.author.id)
                    .or_insert_with(|| message.author.clone());
            }
        }
        found.into_values().collect()
    }
}

/// Decides whether a consent notice should be posted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoticePolicy {
    Always,
    /// Post with `probability`, or always when more than `crowd_threshold`
    /// users are unopted.
    Damped {
        probability: f64,
        crowd_threshold: usize,
    },
    Never,
}

impl NoticePolicy {
    pub fn from_config(config: &ConsentConfig) -> Self {
        match config.notice_policy {
            NoticePolicyKind::Always => NoticePolicy::Always,
            NoticePolicyKind::Damped => NoticePolicy::Damped {
                probability: config.notice_probability,
                crowd_threshold: config.notice_crowd_threshold,
            },
            NoticePolicyKind::Never => NoticePolicy::Never,
        }
    }

    pub fn should_notify(&self, unopted: usize, rng: &mut impl Rng) -> bool {
        if unopted == 0 {
            return false;
        }
        match *self {
            NoticePolicy::Always => true,
            NoticePolicy::Damped {
                probability,
                crowd_threshold,
            } => unopted > crowd_threshold || rng.gen_bool(probability.clamp(0.0, 1.0)),
            NoticePolicy::Never => false,
        }
    }
}

/// Posts the opt-in / opt-out notice.
#[derive(Debug, Clone)]
pub struct ConsentNotifier {
    policy: NoticePolicy,
    command_prefix: String,
}

impl ConsentNotifier {
    pub fn new(policy: NoticePolicy, command_prefix: impl Into<String>) -> Self {
        Self {
            policy,
            command_prefix: command_prefix.into(),
        }
    }

    /// Renders the notice addressed to `users`.
    pub fn render(&self, users: &[Author]) -> Notice {
        let prefix = &self.command_prefix;
        Notice {
            title: OPTIN_NOTICE_TITLE.to_string(),
            description: format!(
                "Hey there! Looks like some user(s) have not opted in or out of AI User!\n\
                 Please use `{prefix}aiuser optin` or `{prefix}aiuser optout` to opt in or out \
                 of sending messages to OpenAI or an external endpoint.\n\
                 This notice will stop showing up once everyone chatting has opted in or out."
            ),
            mentions: users.iter().map(|u| u.id).collect(),
        }
    }

    /// Posts the notice to `channel` when the policy allows.
    ///
    /// Returns whether a notice was delivered. Delivery failures are logged.
    pub async fn notify(&self, sink: &dyn NoticeSink, channel: ChannelId, users: &[Author]) -> bool {
        let post = self.policy.should_notify(users.len(), &mut rand::thread_rng());
        if !post {
            debug!(unopted = users.len(), "consent notice withheld by policy");
            return false;
        }

        let notice = self.render(users);
        match sink.send_notice(channel, &notice).await {
            Ok(()) => {
                info!(%channel, unopted = users.len(), "consent notice sent");
                true
            }
            Err(e) => {
                warn!(%channel, error = %e, "failed to send consent notice");
                false
            }
        }
    }
}

/// Whether `message` is a consent notice previously posted by `bot`.
pub fn is_own_notice(message: &PlatformMessage, bot: UserId) -> bool {
    message.author.id == bot
        && message
            .embeds
            .first()
            .and_then(|e| e.title.as_deref())
            .is_some_and(|title| title == OPTIN_NOTICE_TITLE)
}
