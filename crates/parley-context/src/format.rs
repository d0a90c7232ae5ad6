// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of platform messages into thread entries.

use parley_core::types::{Embed, EntryContent, PlatformMessage, Role, Sticker, UserId};

use crate::thread::Entry;

/// Neutral placeholder for messages whose attachments could not be rendered.
pub const SKIPPED_MESSAGE: &str = "A message was skipped";

/// What a message contributes, in precedence order. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageContent<'a> {
    Sticker(&'a Sticker),
    Cached(&'a EntryContent),
    UnrenderedAttachments,
    Embed(&'a Embed),
    Text(&'a str),
    Empty,
}

impl<'a> MessageContent<'a> {
    pub fn classify(message: &'a PlatformMessage, cached: Option<&'a EntryContent>) -> Self {
        if let Some(sticker) = message.stickers.first() {
            return Self::Sticker(sticker);
        }
        if let Some(rendering) = cached {
            return Self::Cached(rendering);
        }
        if !message.attachments.is_empty() {
            return Self::UnrenderedAttachments;
        }
        if let Some(embed) = message.embeds.iter().find(|e| e.is_valid()) {
            return Self::Embed(embed);
        }
        if !message.content.is_empty() {
            return Self::Text(&message.content);
        }
        Self::Empty
    }
}

/// Formats messages as seen by the bot with id `bot`.
#[derive(Debug, Clone, Copy)]
pub struct ContentFormatter {
    bot: UserId,
}

impl ContentFormatter {
    pub fn new(bot: UserId) -> Self {
        Self { bot }
    }

    /// Entries for `message`, in the order they should appear in the thread.
    pub fn format(&self, message: &PlatformMessage, cached: Option<&EntryContent>) -> Vec<Entry> {
        let role = self.role_for(message);
        match MessageContent::classify(message, cached) {
            MessageContent::Sticker(sticker) => {
                vec![Entry::new(role, self.frame(message, "sent", &sticker_text(sticker)))]
            }
            MessageContent::Cached(rendering) => {
                let mut entries = vec![Entry::new(role, rendering.clone())];
                if !message.content.is_empty() {
                    entries.push(Entry::new(role, self.frame(message, "said", &message.content)));
                }
                entries
            }
            MessageContent::UnrenderedAttachments => vec![Entry::new(Role::System, SKIPPED_MESSAGE)],
            MessageContent::Embed(embed) => {
                vec![Entry::new(role, self.frame(message, "sent", &embed_text(embed)))]
            }
            MessageContent::Text(text) => vec![Entry::new(role, self.frame(message, "said", text))],
            MessageContent::Empty => Vec::new(),
        }
    }

    fn role_for(&self, message: &PlatformMessage) -> Role {
        if message.author.id == self.bot {
            Role::Assistant
        } else {
            Role::User
        }
    }

    /// Prefixes user content with the author; the bot's own text is unchanged.
    fn frame(&self, message: &PlatformMessage, verb: &str, body: &str) -> String {
        if message.author.id == self.bot {
            body.to_string()
        } else {
            format!("User \"{}\" {verb}: {body}", message.author.display_name)
        }
    }
}

fn sticker_text(sticker: &Sticker) -> String {
    match sticker.description.as_deref().filter(|d| !d.is_empty()) {
        Some(description) => format!("[Sticker: {}] {description}", sticker.name),
        None => format!("[Sticker: {}]", sticker.name),
    }
}

fn embed_text(embed: &Embed) -> String {
    let title = embed.title.as_deref().filter(|t| !t.trim().is_empty());
    let description = embed.description.as_deref().filter(|d| !d.trim().is_empty());
    let mut text = match (title, description) {
        (Some(t), Some(d)) => format!("[Embed with title \"{t}\" and description \"{d}\"]"),
        (Some(t), None) => format!("[Embed with title \"{t}\"]"),
        (None, Some(d)) => format!("[Embed with description \"{d}\"]"),
        (None, None) => "[Embed]".to_string(),
    };
    for field in &embed.fields {
        text.push_str(&format!("\n{}: {}", field.name, field.value));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_core::types::{Attachment, Author, ContentPart, EmbedField, ImageUrl};

    const BOT: UserId = UserId(1);

    fn user_message(content: &str) -> PlatformMessage {
        let mut author = Author::new(42, "alice");
        author.display_name = "Alice".into();
        PlatformMessage::text(10, 5, author, content, Utc::now())
    }

    fn bot_message(content: &str) -> PlatformMessage {
        PlatformMessage::text(11, 5, Author::new(1, "parley").into_bot(), content, Utc::now())
    }

    fn image() -> Attachment {
        Attachment {
            filename: "cat.png".into(),
            content_type: Some("image/png".into()),
            url: "https://cdn.example/cat.png".into(),
        }
    }

    fn texts(entries: &[Entry]) -> Vec<(Role, &str)> {
        entries
            .iter()
            .map(|e| (e.role(), e.text().unwrap_or("<parts>")))
            .collect()
    }

    #[test]
    fn user_text_is_framed_and_bot_text_is_not() {
        let formatter = ContentFormatter::new(BOT);
        let user = formatter.format(&user_message("hello"), None);
        assert_eq!(texts(&user), [(Role::User, "User \"Alice\" said: hello")]);

        let bot = formatter.format(&bot_message("hi Alice"), None);
        assert_eq!(texts(&bot), [(Role::Assistant, "hi Alice")]);
    }

    #[test]
    fn sticker_beats_everything() {
        let message = user_message("caption").with_attachment(image()).with_sticker(Sticker {
            name: "wave".into(),
            description: Some("A waving hand".into()),
        });
        let entries = ContentFormatter::new(BOT).format(&message, None);
        assert_eq!(
            texts(&entries),
            [(Role::User, "User \"Alice\" sent: [Sticker: wave] A waving hand")]
        );
    }

    #[test]
    fn cached_rendering_then_text() {
        let message = user_message("look at this").with_attachment(image());
        let rendering = EntryContent::Parts(vec![ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: "data:image/png;base64,AAAA".into(),
            },
        }]);
        let entries = ContentFormatter::new(BOT).format(&message, Some(&rendering));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content(), &rendering);
        assert_eq!(entries[1].text(), Some("User \"Alice\" said: look at this"));
    }

    #[test]
    fn unrendered_attachment_becomes_system_placeholder() {
        let message = user_message("see file").with_attachment(image());
        let entries = ContentFormatter::new(BOT).format(&message, None);
        assert_eq!(texts(&entries), [(Role::System, SKIPPED_MESSAGE)]);
    }

    #[test]
    fn valid_embed_is_summarized() {
        let message = user_message("").with_embed(Embed::default()).with_embed(Embed {
            title: Some("Release 1.2".into()),
            description: Some("Bug fixes".into()),
            fields: vec![EmbedField {
                name: "Download".into(),
                value: "crates.io".into(),
            }],
        });
        let entries = ContentFormatter::new(BOT).format(&message, None);
        assert_eq!(
            entries[0].text(),
            Some(
                "User \"Alice\" sent: [Embed with title \"Release 1.2\" and description \"Bug fixes\"]\nDownload: crates.io"
            )
        );
    }

    #[test]
    fn invalid_embed_falls_through_to_text() {
        let message = user_message("plain").with_embed(Embed::default());
        assert_eq!(
            MessageContent::classify(&message, None),
            MessageContent::Text("plain")
        );
    }

    #[test]
    fn empty_message_yields_nothing() {
        assert!(ContentFormatter::new(BOT).format(&user_message(""), None).is_empty());
    }
}
