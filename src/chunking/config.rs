// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token budget and boundary settings for semantic chunking.

use crate::errors::ConfigError;

/// Default cosine similarity below which a segment boundary is placed.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Default minimum tokens per chunk.
pub const DEFAULT_MIN_TOKENS: usize = 64;

/// Default maximum tokens per chunk.
pub const DEFAULT_MAX_TOKENS: usize = 512;

/// Default token count at which an accumulating chunk is emitted.
pub const DEFAULT_TARGET_CHUNK_SIZE: usize = 256;

/// Default number of sentences carried into the next chunk.
pub const DEFAULT_OVERLAP_SIZE: usize = 0;

/// Configuration for the chunk assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    /// Adjacent similarity strictly below this starts a new segment.
    pub similarity_threshold: f32,
    /// Minimum tokens per chunk (inclusive).
    pub min_tokens: usize,
    /// Maximum tokens per chunk (inclusive).
    pub max_tokens: usize,
    /// Emit the accumulator once it reaches this many tokens.
    pub target_chunk_size: usize,
    /// Sentences carried from the end of one chunk into the next.
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            min_tokens: DEFAULT_MIN_TOKENS,
            max_tokens: DEFAULT_MAX_TOKENS,
            target_chunk_size: DEFAULT_TARGET_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
        }
    }
}

impl ChunkingConfig {
    /// Creates a validated config without overlap.
    pub fn new(
        similarity_threshold: f32,
        min_tokens: usize,
        max_tokens: usize,
        target_chunk_size: usize,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            similarity_threshold,
            min_tokens,
            max_tokens,
            target_chunk_size,
            overlap_size: 0,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the number of overlap sentences.
    pub fn with_overlap(mut self, overlap_size: usize) -> Self {
        self.overlap_size = overlap_size;
        self
    }

    /// Rejects budgets the assembler cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::ZeroMaxTokens);
        }
        if self.min_tokens > self.max_tokens {
            return Err(ConfigError::MinExceedsMax {
                min: self.min_tokens,
                max: self.max_tokens,
            });
        }
        if self.target_chunk_size < self.min_tokens || self.target_chunk_size > self.max_tokens {
            return Err(ConfigError::TargetOutOfRange {
                target: self.target_chunk_size,
                min: self.min_tokens,
                max: self.max_tokens,
            });
        }
        if !self.similarity_threshold.is_finite()
            || !(-1.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(ConfigError::OutOfRange {
                name: "similarity_threshold",
                value: self.similarity_threshold,
                low: -1.0,
                high: 1.0,
            });
        }
        Ok(())
    }
}
