// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Parley context assembler.

use thiserror::Error;

/// The primary error type used across collaborator traits and thread assembly.
#[derive(Debug, Error)]
pub enum ParleyError {
    /// Messaging platform errors (history fetch, reference lookup, notice delivery).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Scoped settings store errors.
    #[error("settings error for `{key}`: {source}")]
    Settings {
        key: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Consent registry could not be read.
    #[error("consent registry error: {source}")]
    Consent {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ParleyError {
    /// Shorthand for a platform error without an underlying source.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
            source: None,
        }
    }
}
