// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Parley.
//!
//! Provides the error type, the platform message model, and the collaborator
//! traits (history, settings, consent, access policy, notices) that thread
//! assembly consumes.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ParleyError;
pub use types::{
    Author, BotIdentity, ChannelId, ContentPart, EntryContent, GuildId, MessageId,
    PlatformMessage, Role, RoleId, Scope, SettingKey, UserId,
};

pub use traits::{AccessPolicy, ConsentStore, HistorySource, NoticeSink, SettingsStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parley_error_variants_render() {
        let platform = ParleyError::platform("history unavailable");
        assert_eq!(platform.to_string(), "platform error: history unavailable");

        let settings = ParleyError::Settings {
            key: SettingKey::Model.to_string(),
            source: Box::new(std::io::Error::other("io")),
        };
        assert!(settings.to_string().contains("`model`"));

        let _consent = ParleyError::Consent {
            source: Box::new(std::io::Error::other("io")),
        };
        let _internal = ParleyError::Internal("x".into());
    }

    #[test]
    fn all_collaborator_traits_are_exported() {
        fn _history<T: HistorySource>() {}
        fn _settings<T: SettingsStore>() {}
        fn _consent<T: ConsentStore>() {}
        fn _access<T: AccessPolicy>() {}
        fn _notice<T: NoticeSink>() {}
    }
}
