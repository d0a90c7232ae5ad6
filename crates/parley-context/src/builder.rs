// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Thread assembly: seeding, history backread, reply expansion and consent.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parley_config::model::{ParleyConfig, ScanImageMode};
use parley_core::error::ParleyError;
use parley_core::traits::{AccessPolicy, ConsentStore, HistorySource, NoticeSink, SettingsStore};
use parley_core::types::{
    BotIdentity, EntryContent, HistoryQuery, MessageId, PlatformMessage, Role,
};
use tracing::{debug, info};

use crate::consent::{ConsentNotifier, ConsentRegistry, NoticePolicy, is_own_notice};
use crate::format::ContentFormatter;
use crate::policy::GuildPolicy;
use crate::prompt::{PromptSelector, render_template};
use crate::thread::{Entry, Insertion, Thread};
use crate::token::{TokenizerRegistry, resolve_budget};

/// Lower bound on history set by a prompt override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideWindow {
    pub start: DateTime<Utc>,
    /// Whether a message sent exactly at `start` belongs to the window.
    pub inclusive: bool,
}

impl OverrideWindow {
    /// Only messages after this instant are fetched.
    pub fn lower_bound(&self) -> DateTime<Utc> {
        let second = chrono::Duration::seconds(1);
        if self.inclusive {
            self.start - second
        } else {
            self.start + second
        }
    }
}

/// Per-request inputs that are not part of the triggering message.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub override_window: Option<OverrideWindow>,
    /// Pre-rendered content (e.g. images) keyed by message id.
    pub cached: HashMap<MessageId, EntryContent>,
}

/// External services the builder reads from and posts to.
#[derive(Clone)]
pub struct Collaborators {
    pub history: Arc<dyn HistorySource>,
    pub settings: Arc<dyn SettingsStore>,
    pub consent: Arc<dyn ConsentStore>,
    pub access: Arc<dyn AccessPolicy>,
    pub notices: Arc<dyn NoticeSink>,
}

/// Builds threads for one bot. Shared across requests.
pub struct ThreadBuilder {
    config: ParleyConfig,
    bot: BotIdentity,
    collaborators: Collaborators,
    prompts: PromptSelector,
    tokenizers: TokenizerRegistry,
    formatter: ContentFormatter,
    notifier: ConsentNotifier,
}

impl ThreadBuilder {
    /// Creates a builder, loading the configured system prompt.
    pub async fn new(config: ParleyConfig, bot: BotIdentity, collaborators: Collaborators) -> Self {
        let prompts = PromptSelector::load(&config.prompt).await;
        let notifier = ConsentNotifier::new(
            NoticePolicy::from_config(&config.consent),
            config.bot.command_prefix.clone(),
        );
        Self {
            formatter: ContentFormatter::new(bot.id),
            tokenizers: TokenizerRegistry::new(),
            config,
            bot,
            collaborators,
            prompts,
            notifier,
        }
    }

    /// Seeds a thread with the triggering message and the system prompt.
    ///
    /// `prompt_override` replaces prompt selection only; the triggering
    /// message is still subject to the normal inclusion checks.
    pub async fn initialize(
        &self,
        message: &PlatformMessage,
        prompt_override: Option<&str>,
        ctx: RequestContext,
    ) -> Result<Thread, ParleyError> {
        let settings = self.collaborators.settings.as_ref();
        let policy = GuildPolicy::resolve(settings, &self.config, message.guild_id).await?;
        let consent = ConsentRegistry::new(
            self.collaborators.consent.consent_sets().await?,
            policy.opt_in_by_default,
        );
        let budget = resolve_budget(&policy.model, policy.custom_token_limit);
        let counter = self
            .tokenizers
            .counter_for(&policy.model, self.config.context.image_token_cost)?;

        let mut thread = Thread::new(
            message.clone(),
            policy,
            consent,
            counter,
            budget,
            ctx.override_window,
            ctx.cached,
        );

        self.process_with_replies(&mut thread, message).await?;

        let prompt = match prompt_override.filter(|text| !text.is_empty()) {
            Some(text) => text.to_string(),
            None => self.prompts.select(settings, message).await?.text,
        };
        let rendered = render_template(&prompt, &self.bot, message);
        thread.set_system(Entry::new(Role::System, rendered));

        if self.wants_vision(&thread, message).await {
            let model = thread.policy.scan_images_model.clone();
            debug!(model = model.as_str(), "trigger carries an image, switching to vision model");
            thread.switch_to_vision(model);
        }

        Ok(thread)
    }

    /// Adds prior channel history to a seeded thread.
    pub async fn extend_with_history(&self, thread: &mut Thread) -> Result<(), ParleyError> {
        let origin = thread.origin().clone();
        let query = HistoryQuery {
            channel: origin.channel_id,
            before: origin.id,
            before_time: origin.created_at,
            after: thread.window().map(|w| w.lower_bound()),
            limit: thread.policy.backread_limit,
            newest_first: true,
        };
        let mut page = self.collaborators.history.fetch_history(&query).await?;
        if page.is_empty() {
            debug!(message = %origin.id, "no prior history");
            return Ok(());
        }
        page.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let max_gap = thread.policy.max_gap();
        if gap_exceeds(&origin, &page[0], max_gap) {
            debug!(message = %origin.id, "newest prior message is outside the backread window");
            return Ok(());
        }

        let unopted = {
            let window = self.config.context.consent_scan_window;
            let scanned = if window == 0 {
                &page[..]
            } else {
                &page[..window.min(page.len())]
            };
            thread.consent.unopted_authors(scanned)
        };

        for (i, message) in page.iter().enumerate() {
            let continuous = page
                .get(i + 1)
                .is_some_and(|older| !gap_exceeds(message, older, max_gap));

            if is_own_notice(message, self.bot.id) {
                if !continuous {
                    debug!(
                        message = %message.id,
                        "time gap reached after own notice, stopping history backread"
                    );
                    break;
                }
                continue;
            }
            if self.process_with_replies(thread, message).await? == Insertion::Exhausted {
                debug!(
                    tokens = thread.tokens(),
                    budget = thread.budget(),
                    message = %origin.id,
                    "token budget reached, stopping history backread"
                );
                break;
            }
            if !continuous {
                debug!(message = %message.id, "time gap reached, stopping history backread");
                break;
            }
        }

        if !unopted.is_empty() && !thread.policy.disable_notice {
            self.notifier
                .notify(self.collaborators.notices.as_ref(), origin.channel_id, &unopted)
                .await;
        }

        Ok(())
    }

    /// Whether `message` may be added to `thread`.
    ///
    /// With `force`, a message already in the thread is admitted again;
    /// every other check still applies.
    pub async fn check_if_includable(
        &self,
        thread: &Thread,
        message: &PlatformMessage,
        force: bool,
    ) -> Result<bool, ParleyError> {
        if thread.is_exhausted() {
            return Ok(false);
        }
        if !force && thread.contains_message(message.id) {
            debug!(message = %message.id, "skipping duplicate message");
            return Ok(false);
        }
        if let Some(ref pattern) = thread.policy.ignore {
            if pattern.is_match(&message.content).await {
                debug!(message = %message.id, "message matches ignore pattern");
                return Ok(false);
            }
        }
        if !self.collaborators.access.allows(&message.author).await? {
            debug!(author = %message.author.id, "author blocked by access policy");
            return Ok(false);
        }
        if !thread.consent.permits(message.author.id, self.bot.id) {
            debug!(author = %message.author.id, "author has not consented");
            return Ok(false);
        }
        Ok(true)
    }

    /// Seeds a thread and extends it with history.
    pub async fn build_thread(
        &self,
        message: &PlatformMessage,
        prompt_override: Option<&str>,
        ctx: RequestContext,
    ) -> Result<Thread, ParleyError> {
        let mut thread = self.initialize(message, prompt_override, ctx).await?;
        self.extend_with_history(&mut thread).await?;

        info!(
            message = %message.id,
            entries = thread.len(),
            tokens = thread.tokens(),
            budget = thread.budget(),
            model = thread.model(),
            "thread assembled"
        );
        Ok(thread)
    }

    /// Adds one message if it passes the inclusion checks.
    pub(crate) async fn add_message(
        &self,
        thread: &mut Thread,
        message: &PlatformMessage,
        force: bool,
    ) -> Result<Insertion, ParleyError> {
        if thread.is_exhausted() {
            return Ok(Insertion::Exhausted);
        }
        if !self.check_if_includable(thread, message, force).await? {
            return Ok(Insertion::Skipped);
        }
        let entries = self.formatter.format(message, thread.cached(message.id));
        if entries.is_empty() {
            return Ok(Insertion::Skipped);
        }
        Ok(thread.prepend_message(message.id, entries))
    }

    /// Adds `message`, then follows its reply chain up to the depth cap.
    ///
    /// Each referenced message is prepended ahead of the one replying to it.
    /// The outcome reported is that of `message` itself unless the budget ran
    /// out along the chain.
    async fn process_with_replies(
        &self,
        thread: &mut Thread,
        message: &PlatformMessage,
    ) -> Result<Insertion, ParleyError> {
        let outcome = self.add_message(thread, message, false).await?;
        if outcome != Insertion::Added {
            return Ok(outcome);
        }

        let max_depth = self.config.context.max_reply_depth;
        let mut pending = self.reply_target(message).await;
        let mut depth = 0;
        while let Some(target) = pending.take() {
            if depth >= max_depth {
                debug!(message = %message.id, max_depth, "reply depth cap reached");
                break;
            }
            depth += 1;
            match self.add_message(thread, &target, false).await? {
                Insertion::Added => pending = self.reply_target(&target).await,
                Insertion::Skipped => {}
                Insertion::Exhausted => return Ok(Insertion::Exhausted),
            }
        }

        Ok(outcome)
    }

    /// The message `message` replies to, unless the bot wrote it.
    async fn reply_target(&self, message: &PlatformMessage) -> Option<PlatformMessage> {
        if message.author.id == self.bot.id {
            return None;
        }
        self.referenced(message).await
    }

    async fn referenced(&self, message: &PlatformMessage) -> Option<PlatformMessage> {
        let reference = message.reference.as_ref()?;
        if let Some(ref resolved) = reference.resolved {
            return Some(resolved.as_ref().clone());
        }
        match self.collaborators.history.resolve_reference(message).await {
            Ok(found) => found,
            Err(e) => {
                debug!(message = %message.id, error = %e, "could not resolve reply reference");
                None
            }
        }
    }

    /// Whether the trigger (or the message it replies to) leads with an image
    /// and the guild hands images to a vision model.
    async fn wants_vision(&self, thread: &Thread, message: &PlatformMessage) -> bool {
        let policy = &thread.policy;
        if message.interaction
            || !policy.scan_images
            || policy.scan_images_mode != ScanImageMode::Llm
        {
            return false;
        }
        if message.has_leading_image() {
            return true;
        }
        match self.referenced(message).await {
            Some(replied) => replied.has_leading_image(),
            None => false,
        }
    }
}

fn gap_exceeds(a: &PlatformMessage, b: &PlatformMessage, max_gap: chrono::Duration) -> bool {
    (a.created_at - b.created_at).abs() > max_gap
}
