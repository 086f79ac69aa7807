//! Word-count to token-bound conversion.
//!
//! The backend counts tokens, users think in words. One word is taken as
//! roughly 1.3 tokens; the lower bound is half the requested word count.

use serde::Serialize;

/// Smallest word count offered by the front-ends.
pub const WORD_LENGTH_MIN: u32 = 30;
/// Largest word count offered by the front-ends (≈ 1024 tokens).
pub const WORD_LENGTH_MAX: u32 = 790;
/// Slider granularity in the web form.
pub const WORD_LENGTH_STEP: u32 = 10;
/// Preselected word count.
pub const WORD_LENGTH_DEFAULT: u32 = 80;

/// Hard ceiling of the model's generation length.
pub const MAX_TOKENS_CEILING: u32 = 1024;
/// Floor applied to the minimum generation length.
pub const MIN_TOKENS_FLOOR: u32 = 20;

/// Token bounds handed to the summarization backend.
///
/// `min_tokens <= max_tokens` is not guaranteed: very small or very large
/// word counts invert the pair. Use [`LengthBounds::clamped`] before sending
/// them to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LengthBounds {
    pub min_tokens: u32,
    pub max_tokens: u32,
}

impl LengthBounds {
    pub fn is_inverted(&self) -> bool {
        self.min_tokens > self.max_tokens
    }

    /// Lower `min_tokens` to `max_tokens` when the pair is inverted.
    pub fn clamped(self) -> Self {
        Self {
            min_tokens: self.min_tokens.min(self.max_tokens),
            max_tokens: self.max_tokens,
        }
    }
}

/// Compute token bounds for a desired summary length in words.
///
/// `max = min(floor(1.3 * words), 1024)`, `min = max(floor(0.5 * words), 20)`.
/// Integer arithmetic keeps the floors exact.
pub fn estimate_bounds(words: u32) -> LengthBounds {
    let words = u64::from(words);
    let max_tokens = (words * 13 / 10).min(u64::from(MAX_TOKENS_CEILING)) as u32;
    let min_tokens = (words / 2).max(u64::from(MIN_TOKENS_FLOOR)) as u32;
    LengthBounds {
        min_tokens,
        max_tokens,
    }
}
