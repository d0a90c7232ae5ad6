// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the collaborator traits and thread assembly.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Platform identifier of a user (humans and bots alike).
    UserId
);
snowflake!(
    /// Platform identifier of a guild (server).
    GuildId
);
snowflake!(
    /// Platform identifier of a text channel.
    ChannelId
);
snowflake!(
    /// Platform identifier of a guild role.
    RoleId
);
snowflake!(
    /// Platform identifier of a message.
    MessageId
);

/// Author of a platform message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    /// Account name.
    pub name: String,
    /// Nickname or display name within the guild.
    pub display_name: String,
    /// Whether the account is a bot.
    #[serde(default)]
    pub bot: bool,
    /// Role ids in the order the platform reports them (highest first).
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl Author {
    /// A human author whose display name equals the account name.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: UserId(id),
            display_name: name.clone(),
            name,
            bot: false,
            roles: Vec::new(),
        }
    }

    /// Returns the author marked as a bot account.
    pub fn into_bot(mut self) -> Self {
        self.bot = true;
        self
    }

    /// Platform mention markup for this author.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub url: String,
}

impl Attachment {
    /// Whether the attachment declares an `image/*` content type.
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"))
    }
}

/// A sticker sent in place of (or with) text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sticker {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A single name/value field of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// A rich embed attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// An embed carries something worth summarizing when it has a non-empty
    /// title or description.
    pub fn is_valid(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.title) || present(&self.description)
    }
}

/// A reply pointer to another message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReference {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    /// The referenced message when the platform delivered it inline.
    #[serde(default)]
    pub resolved: Option<Box<PlatformMessage>>,
}

/// A message as delivered by the messaging platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformMessage {
    pub id: MessageId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub guild_name: Option<String>,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub channel_name: Option<String>,
    pub author: Author,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub stickers: Vec<Sticker>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub reference: Option<MessageReference>,
    /// True for structured (slash-style) invocations.
    #[serde(default)]
    pub interaction: bool,
}

impl PlatformMessage {
    /// A plain text message with no guild context.
    pub fn text(
        id: u64,
        channel: u64,
        author: Author,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId(id),
            guild_id: None,
            guild_name: None,
            channel_id: ChannelId(channel),
            channel_name: None,
            author,
            content: content.into(),
            created_at,
            attachments: Vec::new(),
            stickers: Vec::new(),
            embeds: Vec::new(),
            reference: None,
            interaction: false,
        }
    }

    pub fn in_guild(mut self, id: u64, name: impl Into<String>) -> Self {
        self.guild_id = Some(GuildId(id));
        self.guild_name = Some(name.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_sticker(mut self, sticker: Sticker) -> Self {
        self.stickers.push(sticker);
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Marks this message as a reply to `target`, carrying it inline.
    pub fn replying_to(mut self, target: PlatformMessage) -> Self {
        self.reference = Some(MessageReference {
            message_id: target.id,
            channel_id: target.channel_id,
            resolved: Some(Box::new(target)),
        });
        self
    }

    /// Whether the first attachment is an image.
    pub fn has_leading_image(&self) -> bool {
        self.attachments.first().is_some_and(Attachment::is_image)
    }
}

/// Identity of the bot the thread is assembled for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: UserId,
    pub display_name: String,
}

/// Role of a turn in the assembled thread.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Reference to an image for vision-capable models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// One typed part of multimodal entry content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Content of a thread entry: plain text or an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<String> for EntryContent {
    fn from(text: String) -> Self {
        EntryContent::Text(text)
    }
}

impl From<&str> for EntryContent {
    fn from(text: &str) -> Self {
        EntryContent::Text(text.to_string())
    }
}

/// Scope at which a setting is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    Global,
    Guild(GuildId),
    Channel(ChannelId),
    Role(RoleId),
    Member { guild: GuildId, user: UserId },
}

/// Setting keys read by the assembler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SettingKey {
    Model,
    ScanImagesModel,
    CustomModelTokensLimit,
    MessagesBackread,
    MessagesBackreadSeconds,
    OptinByDefault,
    OptinDisableEmbed,
    IgnoreRegex,
    ScanImages,
    ScanImagesMode,
    CustomTextPrompt,
}

/// Global opt-in and opt-out sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentSets {
    #[serde(default)]
    pub opt_in: HashSet<UserId>,
    #[serde(default)]
    pub opt_out: HashSet<UserId>,
}

/// A paginated history read, newest-first unless stated otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub channel: ChannelId,
    /// Only messages older than this one.
    pub before: MessageId,
    pub before_time: DateTime<Utc>,
    /// Only messages newer than this instant.
    pub after: Option<DateTime<Utc>>,
    pub limit: usize,
    pub newest_first: bool,
}

/// An informational notice posted to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    /// Users the notice is addressed to.
    pub mentions: Vec<UserId>,
}
