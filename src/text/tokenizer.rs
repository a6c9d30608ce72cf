// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token counting adapters.
//!
//! The chunk assembler only needs a deterministic `text -> count` mapping.
//! Counts are always taken on the full joined text of a span, so adapters do
//! not need to be additive.

use anyhow::{Context, Result};
use serde::Deserialize;
use tiktoken_rs::CoreBPE;

use crate::errors::ConfigError;

/// Maps text to a token count. Must be deterministic for identical text.
pub trait TokenCounter: Send + Sync {
    /// Identifier used in logs and stats.
    fn name(&self) -> &str;

    /// Number of tokens in `text`.
    fn count_tokens(&self, text: &str) -> usize;
}

/// Which tokenizer a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerKind {
    /// OpenAI cl100k BPE
    #[default]
    Cl100k,
    /// Whitespace-separated words
    Words,
}

impl std::str::FromStr for TokenizerKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" | "tiktoken" => Ok(TokenizerKind::Cl100k),
            "words" | "whitespace" => Ok(TokenizerKind::Words),
            other => Err(ConfigError::UnknownVariant {
                kind: "tokenizer",
                value: other.to_string(),
            }),
        }
    }
}

impl TokenizerKind {
    /// Instantiates the tokenizer.
    pub fn build(self) -> Result<Box<dyn TokenCounter>> {
        Ok(match self {
            TokenizerKind::Cl100k => Box::new(TiktokenCounter::cl100k()?),
            TokenizerKind::Words => Box::new(WordCounter),
        })
    }
}

/// BPE token counter backed by `tiktoken-rs`.
pub struct TiktokenCounter {
    bpe: CoreBPE,
    name: String,
}

impl TiktokenCounter {
    pub fn cl100k() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().context("Failed to load cl100k_base tokenizer")?;
        Ok(Self {
            bpe,
            name: "cl100k_base".to_string(),
        })
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Counts whitespace-separated words.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn name(&self) -> &str {
        "words"
    }

    fn count_tokens(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_counter_counts_words() {
        assert_eq!(WordCounter.count_tokens(""), 0);
        assert_eq!(WordCounter.count_tokens("one two  three\nfour"), 4);
    }

    #[test]
    fn tiktoken_counter_is_deterministic() {
        let counter = TiktokenCounter::cl100k().unwrap();
        let text = "Semantic chunking keeps related sentences together.";
        let first = counter.count_tokens(text);
        assert!(first > 0);
        assert_eq!(first, counter.count_tokens(text));
        assert_eq!(counter.count_tokens(""), 0);
    }

    #[test]
    fn tokenizer_kind_parses_aliases() {
        assert_eq!("tiktoken".parse::<TokenizerKind>(), Ok(TokenizerKind::Cl100k));
        assert_eq!("Words".parse::<TokenizerKind>(), Ok(TokenizerKind::Words));
        assert!("sentencepiece".parse::<TokenizerKind>().is_err());
    }
}
