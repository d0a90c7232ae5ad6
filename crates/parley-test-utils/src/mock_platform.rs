// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory channel history and notice capture.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::error::ParleyError;
use parley_core::traits::{HistorySource, NoticeSink};
use parley_core::types::{ChannelId, HistoryQuery, Notice, PlatformMessage};

/// A mock channel history.
///
/// Serves stored messages through `fetch_history` with the query's bounds
/// applied, and records every query for assertions.
#[derive(Default)]
pub struct MockHistory {
    messages: Mutex<Vec<PlatformMessage>>,
    queries: Mutex<Vec<HistoryQuery>>,
    resolutions: AtomicUsize,
    fail_fetch: AtomicBool,
}

impl MockHistory {
    pub fn new(messages: Vec<PlatformMessage>) -> Self {
        Self {
            messages: Mutex::new(messages),
            ..Default::default()
        }
    }

    pub async fn push(&self, message: PlatformMessage) {
        self.messages.lock().await.push(message);
    }

    /// Makes subsequent `fetch_history` calls fail.
    pub fn fail_fetches(&self) {
        self.fail_fetch.store(true, Ordering::SeqCst);
    }

    /// Queries received so far.
    pub async fn queries(&self) -> Vec<HistoryQuery> {
        self.queries.lock().await.clone()
    }

    /// Number of `resolve_reference` calls.
    pub fn resolution_count(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for MockHistory {
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<PlatformMessage>, ParleyError> {
        self.queries.lock().await.push(query.clone());
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(ParleyError::platform("history unavailable"));
        }

        let mut page: Vec<PlatformMessage> = self
            .messages
            .lock()
            .await
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
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        let Some(ref reference) = message.reference else {
            return Ok(None);
        };
        Ok(self
            .messages
            .lock()
            .await
            .iter()
            .find(|m| m.id == reference.message_id)
            .cloned())
    }
}

/// Captures notices instead of posting them.
#[derive(Default)]
pub struct MockNotices {
    sent: Arc<Mutex<Vec<(ChannelId, Notice)>>>,
    fail: AtomicBool,
}

impl MockNotices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent sends fail.
    pub fn fail_sends(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub async fn sent(&self) -> Vec<(ChannelId, Notice)> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl NoticeSink for MockNotices {
    async fn send_notice(&self, channel: ChannelId, notice: &Notice) -> Result<(), ParleyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ParleyError::platform("missing permission to send embeds"));
        }
        self.sent.lock().await.push((channel, notice.clone()));
        Ok(())
    }
}
