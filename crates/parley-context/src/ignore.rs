// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-guild ignore pattern.

use std::sync::Arc;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Compiled program size cap for user-supplied patterns.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// A compiled ignore pattern with a bounded evaluation time.
///
/// Messages whose text matches are left out of threads.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    regex: Arc<Regex>,
    timeout: Duration,
}

impl IgnorePattern {
    /// Compiles `pattern`. A malformed or oversized pattern is logged and
    /// yields `None`, so the guild behaves as if no pattern were set.
    pub fn compile(pattern: &str, timeout: Duration) -> Option<Self> {
        match RegexBuilder::new(pattern)
            .size_limit(PATTERN_SIZE_LIMIT)
            .dfa_size_limit(PATTERN_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => Some(Self {
                regex: Arc::new(regex),
                timeout,
            }),
            Err(e) => {
                warn!(pattern, error = %e, "invalid ignore pattern, skipping");
                None
            }
        }
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether `text` matches. Evaluation runs on the blocking pool; a timeout
    /// or a failed task counts as no match.
    pub async fn is_match(&self, text: &str) -> bool {
        let regex = Arc::clone(&self.regex);
        let text = text.to_string();
        let task = tokio::task::spawn_blocking(move || regex.is_match(&text));

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(matched)) => matched,
            Ok(Err(e)) => {
                warn!(pattern = self.as_str(), error = %e, "ignore pattern task failed");
                false
            }
            Err(_) => {
                warn!(
                    pattern = self.as_str(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "ignore pattern timed out, treating as no match"
                );
                false
            }
        }
    }
}
