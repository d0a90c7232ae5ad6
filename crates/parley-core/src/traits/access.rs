// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-level allow/deny list, independent of opt-in state.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::Author;

#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// Whether `author` passes the bot-wide allow/deny list.
    async fn allows(&self, author: &Author) -> Result<bool, ParleyError>;
}
