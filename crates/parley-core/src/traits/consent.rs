// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global opt-in / opt-out registry.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::ConsentSets;

#[async_trait]
pub trait ConsentStore: Send + Sync {
    /// Returns the current opt-in and opt-out sets.
    async fn consent_sets(&self) -> Result<ConsentSets, ParleyError>;
}
