// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory settings, consent and access stores.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use parley_core::error::ParleyError;
use parley_core::traits::{AccessPolicy, ConsentStore, SettingsStore};
use parley_core::types::{Author, ConsentSets, Scope, SettingKey, UserId};

/// Scoped settings held in a map.
#[derive(Default)]
pub struct MockSettings {
    values: Mutex<HashMap<(Scope, SettingKey), Value>>,
}

impl MockSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert for setup code.
    pub fn with(mut self, scope: Scope, key: SettingKey, value: Value) -> Self {
        self.values.get_mut().insert((scope, key), value);
        self
    }

    pub async fn set(&self, scope: Scope, key: SettingKey, value: Value) {
        self.values.lock().await.insert((scope, key), value);
    }
}

#[async_trait]
impl SettingsStore for MockSettings {
    async fn get(&self, scope: Scope, key: SettingKey) -> Result<Option<Value>, ParleyError> {
        Ok(self.values.lock().await.get(&(scope, key)).cloned())
    }
}

/// Global opt-in / opt-out sets.
#[derive(Default)]
pub struct MockConsent {
    sets: Mutex<ConsentSets>,
    fail_reads: AtomicBool,
}

impl MockConsent {
    pub fn new(opt_in: &[u64], opt_out: &[u64]) -> Self {
        Self {
            sets: Mutex::new(ConsentSets {
                opt_in: opt_in.iter().copied().map(UserId).collect(),
                opt_out: opt_out.iter().copied().map(UserId).collect(),
            }),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Makes subsequent `consent_sets` calls fail.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub async fn opt_out(&self, user: u64) {
        let mut sets = self.sets.lock().await;
        sets.opt_in.remove(&UserId(user));
        sets.opt_out.insert(UserId(user));
    }
}

#[async_trait]
impl ConsentStore for MockConsent {
    async fn consent_sets(&self) -> Result<ConsentSets, ParleyError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ParleyError::Consent {
                source: "consent registry unavailable".into(),
            });
        }
        Ok(self.sets.lock().await.clone())
    }
}

/// Allows everyone except an explicit deny set.
#[derive(Default)]
pub struct MockAccess {
    denied: Mutex<HashSet<UserId>>,
}

impl MockAccess {
    pub fn denying(users: &[u64]) -> Self {
        Self {
            denied: Mutex::new(users.iter().copied().map(UserId).collect()),
        }
    }
}

#[async_trait]
impl AccessPolicy for MockAccess {
    async fn allows(&self, author: &Author) -> Result<bool, ParleyError> {
        Ok(!self.denied.lock().await.contains(&author.id))
    }
}
