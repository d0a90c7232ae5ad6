// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end thread assembly.
//!
//! `TestHarness` wires a [`ThreadBuilder`] to in-memory collaborators and
//! keeps handles to each mock for assertions.

use std::sync::Arc;

use serde_json::Value;

use parley_config::model::{NoticePolicyKind, ParleyConfig};
use parley_context::{Collaborators, RequestContext, Thread, ThreadBuilder};
use parley_core::error::ParleyError;
use parley_core::types::{ChannelId, Notice, PlatformMessage, Scope, SettingKey};

use crate::fixtures::bot_identity;
use crate::mock_platform::{MockHistory, MockNotices};
use crate::mock_store::{MockAccess, MockConsent, MockSettings};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: ParleyConfig,
    history: Vec<PlatformMessage>,
    settings: MockSettings,
    opt_in: Vec<u64>,
    opt_out: Vec<u64>,
    denied: Vec<u64>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ParleyConfig::default();
        config.consent.notice_policy = NoticePolicyKind::Always;
        Self {
            config,
            history: Vec::new(),
            settings: MockSettings::new(),
            opt_in: Vec::new(),
            opt_out: Vec::new(),
            denied: Vec::new(),
        }
    }

    /// Replaces the configuration. The default harness posts notices
    /// under the `always` policy.
    pub fn with_config(mut self, config: ParleyConfig) -> Self {
        self.config = config;
        self
    }

    /// Messages served by the history mock, in any order.
    pub fn with_history(mut self, history: Vec<PlatformMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_setting(mut self, scope: Scope, key: SettingKey, value: Value) -> Self {
        self.settings = self.settings.with(scope, key, value);
        self
    }

    pub fn opted_in(mut self, users: &[u64]) -> Self {
        self.opt_in.extend_from_slice(users);
        self
    }

    pub fn opted_out(mut self, users: &[u64]) -> Self {
        self.opt_out.extend_from_slice(users);
        self
    }

    /// Users the access policy blocks.
    pub fn denying(mut self, users: &[u64]) -> Self {
        self.denied.extend_from_slice(users);
        self
    }

    pub async fn build(self) -> TestHarness {
        let history = Arc::new(MockHistory::new(self.history));
        let settings = Arc::new(self.settings);
        let consent = Arc::new(MockConsent::new(&self.opt_in, &self.opt_out));
        let access = Arc::new(MockAccess::denying(&self.denied));
        let notices = Arc::new(MockNotices::new());

        let collaborators = Collaborators {
            history: history.clone(),
            settings: settings.clone(),
            consent: consent.clone(),
            access: access.clone(),
            notices: notices.clone(),
        };
        let builder = ThreadBuilder::new(self.config, bot_identity(), collaborators).await;

        TestHarness {
            builder,
            history,
            settings,
            consent,
            access,
            notices,
        }
    }
}

/// A thread builder backed by mocks.
pub struct TestHarness {
    pub builder: ThreadBuilder,
    pub history: Arc<MockHistory>,
    pub settings: Arc<MockSettings>,
    pub consent: Arc<MockConsent>,
    pub access: Arc<MockAccess>,
    pub notices: Arc<MockNotices>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Builds a thread for `trigger` with no prompt override.
    pub async fn build_thread(&self, trigger: &PlatformMessage) -> Result<Thread, ParleyError> {
        self.builder
            .build_thread(trigger, None, RequestContext::default())
            .await
    }

    pub async fn sent_notices(&self) -> Vec<(ChannelId, Notice)> {
        self.notices.sent().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{message, user};

    #[tokio::test]
    async fn harness_builds_seeded_thread() {
        let alice = user(10, "alice");
        let harness = TestHarness::builder().opted_in(&[10]).build().await;

        let thread = harness.build_thread(&message(2, &alice, "hello", 0)).await.unwrap();
        assert_eq!(thread.len(), 2);
        assert!(thread.contains_message(parley_core::types::MessageId(2)));
        assert_eq!(harness.history.queries().await.len(), 1);
    }
}
