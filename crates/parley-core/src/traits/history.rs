// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message history access on the messaging platform.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{HistoryQuery, PlatformMessage};

/// Read access to channel history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetches up to `query.limit` messages older than `query.before`,
    /// optionally newer than `query.after`.
    async fn fetch_history(
        &self,
        query: &HistoryQuery,
    ) -> Result<Vec<PlatformMessage>, ParleyError>;

    /// Resolves the message `message` replies to.
    ///
    /// Returns `Ok(None)` when the message is not a reply or the target is gone.
    async fn resolve_reference(
        &self,
        message: &PlatformMessage,
    ) -> Result<Option<PlatformMessage>, ParleyError>;
}
