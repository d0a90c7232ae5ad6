// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scoped key-value settings (guild, channel, role, member, global).

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{Scope, SettingKey};

/// Persisted per-scope settings, read-only to the assembler.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the raw value stored for `key` at `scope`, or `None` when unset.
    async fn get(
        &self,
        scope: Scope,
        key: SettingKey,
    ) -> Result<Option<serde_json::Value>, ParleyError>;
}
