// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery of informational notices to a channel.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::types::{ChannelId, Notice};

#[async_trait]
pub trait NoticeSink: Send + Sync {
    /// Posts `notice` to `channel`.
    async fn send_notice(&self, channel: ChannelId, notice: &Notice) -> Result<(), ParleyError>;
}
