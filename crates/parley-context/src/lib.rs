// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat thread assembly for Parley.
//!
//! Given a triggering message, the [`ThreadBuilder`] reconstructs a bounded,
//! ordered conversation thread ready for a chat completion request:
//! - **Seeding**: the triggering message plus a scoped, templated system prompt
//! - **Backread**: prior channel history, newest-first, bounded by count,
//!   time gap and token budget
//! - **Gating**: duplicates, ignore pattern, access policy and user consent
//! - **Formatting**: stickers, cached renderings, attachments, embeds and text
//!   converted into role-tagged entries
//!
//! Unopted users seen during backread may trigger a single consent notice.

pub mod builder;
pub mod consent;
pub mod format;
pub mod ignore;
pub mod policy;
pub mod prompt;
pub mod thread;
pub mod token;

pub use builder::{Collaborators, OverrideWindow, RequestContext, ThreadBuilder};
pub use consent::{ConsentNotifier, ConsentRegistry, NoticePolicy, OPTIN_NOTICE_TITLE};
pub use format::{ContentFormatter, MessageContent, SKIPPED_MESSAGE};
pub use ignore::IgnorePattern;
pub use policy::GuildPolicy;
pub use prompt::{DEFAULT_PROMPT, PromptSelector, PromptSource, render_template};
pub use thread::{Entry, PayloadMessage, Thread};
pub use token::{TokenCounter, TokenizerRegistry, limit_for, normalize_model, resolve_budget};
