// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The assembled conversation thread.
//!
//! A thread holds one optional system entry followed by history entries in
//! chronological order. Entries are only ever prepended to the history while
//! the running token total stays within budget; the total may exceed the
//! budget by at most the entry that crossed it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::OnceLock;

use parley_core::types::{EntryContent, MessageId, PlatformMessage, Role};
use serde::Serialize;
use tracing::debug;

use crate::builder::OverrideWindow;
use crate::consent::ConsentRegistry;
use crate::policy::GuildPolicy;
use crate::token::TokenCounter;

/// One role-tagged turn of the thread.
#[derive(Debug, Clone)]
pub struct Entry {
    role: Role,
    content: EntryContent,
    cost: OnceLock<usize>,
}

impl Entry {
    pub fn new(role: Role, content: impl Into<EntryContent>) -> Self {
        Self {
            role,
            content: content.into(),
            cost: OnceLock::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &EntryContent {
        &self.content
    }

    /// Token cost of this entry, computed on first use.
    pub fn cost(&self, counter: &TokenCounter) -> usize {
        *self.cost.get_or_init(|| counter.content_cost(&self.content))
    }

    /// Plain text content, if the entry is not multi-part.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            EntryContent::Text(text) => Some(text),
            EntryContent::Parts(_) => None,
        }
    }
}

/// One message of a chat completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadMessage {
    pub role: Role,
    pub content: EntryContent,
}

/// Result of offering entries to the thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insertion {
    /// At least one entry was added.
    Added,
    /// The message produced nothing to add.
    Skipped,
    /// The budget was already exceeded; nothing further may be added.
    Exhausted,
}

/// A bounded, ordered conversation history for one triggering message.
#[derive(Debug)]
pub struct Thread {
    system: Option<Entry>,
    entries: VecDeque<Entry>,
    message_ids: HashSet<MessageId>,
    tokens: usize,
    budget: usize,
    model: String,
    vision: bool,
    origin: PlatformMessage,
    window: Option<OverrideWindow>,
    cached: HashMap<MessageId, EntryContent>,
    pub(crate) policy: GuildPolicy,
    pub(crate) consent: ConsentRegistry,
    counter: TokenCounter,
}

impl Thread {
    pub(crate) fn new(
        origin: PlatformMessage,
        policy: GuildPolicy,
        consent: ConsentRegistry,
        counter: TokenCounter,
        budget: usize,
        window: Option<OverrideWindow>,
        cached: HashMap<MessageId, EntryContent>,
    ) -> Self {
        let model = policy.model.clone();
        Self {
            system: None,
            entries: VecDeque::new(),
            message_ids: HashSet::new(),
            tokens: 0,
            budget,
            model,
            vision: false,
            origin,
            window,
            cached,
            policy,
            consent,
            counter,
        }
    }

    /// Whether the running total has passed the budget.
    pub fn is_exhausted(&self) -> bool {
        self.tokens > self.budget
    }

    /// Inserts `entries` for `message` ahead of the existing history,
    /// preserving their relative order. The budget is checked before each
    /// entry.
    pub(crate) fn prepend_message(&mut self, message: MessageId, entries: Vec<Entry>) -> Insertion {
        let mut outcome = Insertion::Skipped;
        for (position, entry) in entries.into_iter().enumerate() {
            if self.is_exhausted() {
                debug!(
                    tokens = self.tokens,
                    budget = self.budget,
                    "token budget exceeded, not adding entry"
                );
                return Insertion::Exhausted;
            }
            self.tokens += entry.cost(&self.counter);
            self.entries.insert(position, entry);
            self.message_ids.insert(message);
            outcome = Insertion::Added;
        }
        outcome
    }

    /// Sets the leading system entry.
    pub(crate) fn set_system(&mut self, entry: Entry) -> Insertion {
        if self.is_exhausted() {
            debug!(
                tokens = self.tokens,
                budget = self.budget,
                "token budget exceeded, no room for system prompt"
            );
            return Insertion::Exhausted;
        }
        if let Some(previous) = self.system.take() {
            self.tokens -= previous.cost(&self.counter);
        }
        self.tokens += entry.cost(&self.counter);
        self.system = Some(entry);
        Insertion::Added
    }

    pub(crate) fn switch_to_vision(&mut self, model: String) {
        self.model = model;
        self.vision = true;
    }

    /// Serializable chat payload: the system entry, then history oldest-first.
    pub fn as_payload(&self) -> Vec<PayloadMessage> {
        self.entries()
            .map(|entry| PayloadMessage {
                role: entry.role,
                content: entry.content.clone(),
            })
            .collect()
    }

    /// All entries in payload order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.system.iter().chain(self.entries.iter())
    }

    pub fn system(&self) -> Option<&Entry> {
        self.system.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len() + usize::from(self.system.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tokens(&self) -> usize {
        self.tokens
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Model the payload should be sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Whether the thread switched to the vision-capable model.
    pub fn uses_vision(&self) -> bool {
        self.vision
    }

    pub fn contains_message(&self, id: MessageId) -> bool {
        self.message_ids.contains(&id)
    }

    pub fn message_count(&self) -> usize {
        self.message_ids.len()
    }

    /// The triggering message.
    pub fn origin(&self) -> &PlatformMessage {
        &self.origin
    }

    pub fn window(&self) -> Option<OverrideWindow> {
        self.window
    }

    pub fn counter(&self) -> &TokenCounter {
        &self.counter
    }

    pub(crate) fn cached(&self, id: MessageId) -> Option<&EntryContent> {
        self.cached.get(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_config::model::ParleyConfig;
    use parley_core::types::Author;

    use crate::token::TokenizerRegistry;

    fn thread(budget: usize) -> Thread {
        let config = ParleyConfig::default();
        let counter = TokenizerRegistry::new().counter_for("gpt-4", 255).unwrap();
        Thread::new(
            PlatformMessage::text(100, 5, Author::new(2, "alice"), "hi", Utc::now()),
            GuildPolicy::from_config(&config),
            ConsentRegistry::default(),
            counter,
            budget,
            None,
            HashMap::new(),
        )
    }

    #[test]
    fn prepended_messages_keep_internal_order() {
        let mut t = thread(10_000);
        t.prepend_message(MessageId(3), vec![Entry::new(Role::User, "newest")]);
        t.prepend_message(
            MessageId(2),
            vec![Entry::new(Role::User, "image"), Entry::new(Role::User, "caption")],
        );
        t.set_system(Entry::new(Role::System, "sys"));

        let texts: Vec<_> = t.entries().filter_map(Entry::text).collect();
        assert_eq!(texts, ["sys", "image", "caption", "newest"]);
        assert_eq!(t.len(), 4);
        assert_eq!(t.message_count(), 2);
    }

    #[test]
    fn running_total_matches_entry_costs() {
        let mut t = thread(10_000);
        t.prepend_message(MessageId(1), vec![Entry::new(Role::User, "one two three")]);
        t.set_system(Entry::new(Role::System, "system prompt"));
        t.set_system(Entry::new(Role::System, "a different system prompt"));

        let sum: usize = t.entries().map(|e| e.cost(t.counter())).sum();
        assert_eq!(sum, t.tokens());
    }

    #[test]
    fn exhausted_thread_rejects_further_entries() {
        let mut t = thread(1);
        assert_eq!(
            t.prepend_message(MessageId(1), vec![Entry::new(Role::User, "several tokens here")]),
            Insertion::Added
        );
        assert!(t.is_exhausted());
        assert_eq!(
            t.prepend_message(MessageId(2), vec![Entry::new(Role::User, "more")]),
            Insertion::Exhausted
        );
        assert_eq!(t.set_system(Entry::new(Role::System, "sys")), Insertion::Exhausted);
        assert!(!t.contains_message(MessageId(2)));
    }

    #[test]
    fn payload_serializes_in_chat_shape() {
        let mut t = thread(10_000);
        t.prepend_message(MessageId(1), vec![Entry::new(Role::Assistant, "hello")]);
        t.set_system(Entry::new(Role::System, "sys"));

        let json = serde_json::to_value(t.as_payload()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "system", "content": "sys"},
                {"role": "assistant", "content": "hello"},
            ])
        );
    }
}
