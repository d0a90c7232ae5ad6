// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token counting and per-model token budgets.
//!
//! Counting uses the tiktoken BPE registered for the model, falling back to
//! `cl100k_base` for models tiktoken does not know. Budgets come from family
//! markers in the model id, refined by an exact table of known models.

use std::sync::Arc;

use dashmap::DashMap;
use parley_core::error::ParleyError;
use parley_core::types::{ContentPart, EntryContent};
use tiktoken_rs::CoreBPE;
use tiktoken_rs::tokenizer::{Tokenizer, get_tokenizer};
use tracing::debug;

/// Budget used when nothing in the model id is recognized.
pub const DEFAULT_TOKEN_LIMIT: usize = 3000;

/// Substring markers checked in order; a later match overrides an earlier one.
const FAMILY_LIMITS: &[(&str, usize)] = &[
    ("gpt-3.5", 3000),
    ("gpt-4", 7000),
    ("8k", 7000),
    ("16k", 15000),
    ("32k", 31000),
    ("100k", 99000),
    ("claude", 99000),
    ("llama-3.1", 123000),
];

/// Exact budgets for normalized model ids. Takes precedence over family markers.
const MODEL_LIMITS: &[(&str, usize)] = &[
    ("gpt-3.5-turbo-1106", 12000),
    ("gpt-4-1106-preview", 123000),
    ("gpt-4-vision-preview", 123000),
    ("claude-2", 98000),
    ("claude-instant-v1", 98000),
    ("toppy-m-7b", 31000),
    ("nous-capybara-34b", 31000),
    ("palm-2-chat-bison", 7000),
    ("claude-v1", 7000),
    ("claude-1.2", 7000),
    ("claude-instant-1.0", 7000),
    ("codellama-34b-instruct", 6000),
    ("synthia-70b", 6000),
    ("mistral-7b-instruct", 6000),
    ("mistral-7b-openorca", 6000),
    ("mythalion-13b", 6000),
    ("xwin-lm-70b", 6000),
    ("goliath-120b", 6000),
    ("weaver", 6000),
    ("palm-2-codechat-bison", 6000),
    ("remm-slerp-l2-13b", 5000),
];

/// Tokenizer used for models tiktoken does not recognize (the gpt-3.5-turbo encoding).
const FALLBACK_TOKENIZER: Tokenizer = Tokenizer::Cl100kBase;

/// Strips provider path segments and a trailing `:variant` suffix.
///
/// `openai/gpt-4-1106-preview` becomes `gpt-4-1106-preview`;
/// `mistralai/mistral-7b-instruct:free` becomes `mistral-7b-instruct`.
pub fn normalize_model(model: &str) -> &str {
    let last = model.rsplit('/').next().unwrap_or(model);
    last.split(':').next().unwrap_or(last)
}

/// Token budget for `model` without any guild override.
pub fn limit_for(model: &str) -> usize {
    let family = FAMILY_LIMITS
        .iter()
        .filter(|(marker, _)| model.contains(marker))
        .next_back()
        .map_or(DEFAULT_TOKEN_LIMIT, |(_, limit)| *limit);

    let normalized = normalize_model(model);
    MODEL_LIMITS
        .iter()
        .find(|(id, _)| *id == normalized)
        .map_or(family, |(_, limit)| *limit)
}

/// Token budget for `model`, honoring a configured override.
pub fn resolve_budget(model: &str, override_limit: Option<usize>) -> usize {
    override_limit.unwrap_or_else(|| limit_for(model))
}

/// Process-wide cache of loaded BPE encoders, keyed by encoding.
///
/// Loading an encoder parses its full rank table, so each encoding is built
/// once and shared by every counter.
#[derive(Default)]
pub struct TokenizerRegistry {
    encoders: DashMap<Tokenizer, Arc<CoreBPE>>,
}

impl TokenizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a counter for `model`, charging `image_cost` per image part.
    pub fn counter_for(&self, model: &str, image_cost: usize) -> Result<TokenCounter, ParleyError> {
        let normalized = normalize_model(model);
        let tokenizer = match get_tokenizer(normalized) {
            Some(tokenizer) => tokenizer,
            None => {
                debug!(model, "no tokenizer registered for model, using fallback");
                FALLBACK_TOKENIZER
            }
        };

        let bpe = match self.encoders.get(&tokenizer) {
            Some(bpe) => Arc::clone(&bpe),
            None => {
                let bpe = tiktoken_rs::get_bpe_from_tokenizer(tokenizer).map_err(|e| {
                    ParleyError::Internal(format!("failed to load {tokenizer:?} encoding: {e}"))
                })?;
                let bpe = Arc::new(bpe);
                self.encoders.insert(tokenizer, Arc::clone(&bpe));
                bpe
            }
        };

        Ok(TokenCounter {
            model: normalized.to_string(),
            bpe,
            image_cost,
        })
    }
}

/// Counts tokens for one model.
#[derive(Clone)]
pub struct TokenCounter {
    model: String,
    bpe: Arc<CoreBPE>,
    image_cost: usize,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("model", &self.model)
            .field("image_cost", &self.image_cost)
            .finish_non_exhaustive()
    }
}

impl TokenCounter {
    /// Number of tokens in `text`. Special-token markup is counted as plain text.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Cost of entry content: exact tokens for text, a fixed charge per image.
    pub fn content_cost(&self, content: &EntryContent) -> usize {
        match content {
            EntryContent::Text(text) => self.count(text),
            EntryContent::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => self.count(text),
                    ContentPart::ImageUrl { .. } => self.image_cost,
                })
                .sum(),
        }
    }

    /// Normalized model id this counter was built for.
    pub fn model(&self) -> &str {
        &self.model
    }
}
