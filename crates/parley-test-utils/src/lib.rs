// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides in-memory collaborators and a harness for fast, deterministic
//! tests of thread assembly without a messaging platform.
//!
//! # Components
//!
//! - [`MockHistory`] - Channel history with query bounds applied
//! - [`MockNotices`] - Captures consent notices
//! - [`MockSettings`], [`MockConsent`], [`MockAccess`] - Stores and policies
//! - [`TestHarness`] - A [`parley_context::ThreadBuilder`] wired to the mocks

pub mod fixtures;
pub mod harness;
pub mod mock_platform;
pub mod mock_store;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_platform::{MockHistory, MockNotices};
pub use mock_store::{MockAccess, MockConsent, MockSettings};
