//! Token counting module - Token estimates for the flattened document
//!
//! The default estimate is the classic rough rule of one token per four
//! characters. BPE encodings from tiktoken are available when a closer count
//! is wanted:
//! - cl100k_base (GPT-4, GPT-3.5-turbo; a fair approximation for Claude)
//! - o200k_base (GPT-4o)

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

/// Characters per token used by the rough estimate
pub const CHARS_PER_TOKEN: usize = 4;

/// Supported token models/encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenModel {
    /// ceil(chars / 4), no encoding
    #[default]
    Estimate,
    /// cl100k_base encoding
    Cl100k,
    /// o200k_base encoding
    O200k,
}

impl TokenModel {
    fn get_bpe(&self) -> Option<&'static CoreBPE> {
        match self {
            TokenModel::Cl100k => CL100K_BPE.as_ref().ok(),
            TokenModel::O200k => O200K_BPE.as_ref().ok(),
            TokenModel::Estimate => None,
        }
    }

    /// List all available models
    pub fn available_models() -> &'static [&'static str] {
        &["estimate", "cl100k", "o200k"]
    }
}

impl fmt::Display for TokenModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenModel::Estimate => "estimate",
            TokenModel::Cl100k => "cl100k",
            TokenModel::O200k => "o200k",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TokenModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "estimate" | "heuristic" | "fast" | "default" => Ok(TokenModel::Estimate),
            "cl100k" | "cl100k_base" | "gpt4" | "gpt-4" | "claude" => Ok(TokenModel::Cl100k),
            "o200k" | "o200k_base" | "gpt4o" | "gpt-4o" => Ok(TokenModel::O200k),
            _ => Err(format!(
                "Unknown model: {}. Available: {}",
                s,
                TokenModel::available_models().join(", ")
            )),
        }
    }
}

// Loaded once on first use
static CL100K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| format!("Failed to load cl100k_base: {}", e)));

static O200K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| format!("Failed to load o200k_base: {}", e)));

/// Count tokens in text using the specified model.
///
/// Falls back to the rough estimate when an encoding cannot be loaded.
pub fn count_tokens(text: &str, model: TokenModel) -> usize {
    if text.is_empty() {
        return 0;
    }

    match model.get_bpe() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => {
            if model != TokenModel::Estimate {
                tracing::warn!("Token model {} unavailable, using estimate", model);
            }
            estimate_tokens(text)
        }
    }
}

/// Rough estimate: one token per four characters, rounded up
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
