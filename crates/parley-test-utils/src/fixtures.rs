// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message and identity fixtures.
//!
//! All fixture messages live in one guild channel; timestamps are seconds
//! after a fixed base instant so gaps are easy to read in tests.

use chrono::{DateTime, Duration, TimeZone, Utc};

use parley_core::types::{Attachment, Author, BotIdentity, PlatformMessage, UserId};

pub const BOT_ID: u64 = 1;
pub const GUILD: u64 = 700;
pub const CHANNEL: u64 = 500;

pub fn bot_identity() -> BotIdentity {
    BotIdentity {
        id: UserId(BOT_ID),
        display_name: "parley".to_string(),
    }
}

/// The bot's own author record.
pub fn bot_author() -> Author {
    Author::new(BOT_ID, "parley").into_bot()
}

/// `secs` seconds after the fixture base instant.
pub fn at(secs: i64) -> DateTime<Utc> {
    let base = Utc
        .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    base + Duration::seconds(secs)
}

pub fn user(id: u64, name: &str) -> Author {
    Author::new(id, name)
}

/// A text message in the fixture channel.
pub fn message(id: u64, author: &Author, text: &str, secs: i64) -> PlatformMessage {
    let mut message =
        PlatformMessage::text(id, CHANNEL, author.clone(), text, at(secs)).in_guild(GUILD, "Test Guild");
    message.channel_name = Some("general".to_string());
    message
}

pub fn image_attachment(name: &str) -> Attachment {
    Attachment {
        filename: name.to_string(),
        content_type: Some("image/png".to_string()),
        url: format!("https://cdn.example/{name}"),
    }
}
