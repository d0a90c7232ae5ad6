// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by thread assembly.
//!
//! Every collaborator is an `#[async_trait]` trait object so the builder can
//! hold them behind `Arc<dyn ...>` and tests can substitute in-memory mocks.

pub mod access;
pub mod consent;
pub mod history;
pub mod notice;
pub mod settings;

pub use access::AccessPolicy;
pub use consent::ConsentStore;
pub use history::HistorySource;
pub use notice::NoticeSink;
pub use settings::SettingsStore;
