// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by the chunking and grouping engines.

use thiserror::Error;

/// Rejected configuration. Raised before any work is done.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("min_tokens ({min}) must not exceed max_tokens ({max})")]
    MinExceedsMax { min: usize, max: usize },

    #[error("max_tokens must be greater than 0")]
    ZeroMaxTokens,

    #[error("target_chunk_size ({target}) must lie within [min_tokens ({min}), max_tokens ({max})]")]
    TargetOutOfRange { target: usize, min: usize, max: usize },

    #[error("{name} must be a finite number in [{low}, {high}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        low: f32,
        high: f32,
    },

    #[error("top_k must be greater than 0")]
    ZeroTopK,

    #[error("min_samples must be greater than 0")]
    ZeroMinSamples,

    #[error("weight_cap ({cap}) must be at least scale_constant ({scale})")]
    CapBelowScale { cap: f32, scale: f32 },

    #[error("batch_size must be greater than 0")]
    ZeroBatchSize,

    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

/// Failure inside the pure chunking/grouping core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("expected {expected} embeddings, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("embedding {index} is missing")]
    MissingEmbedding { index: usize },

    #[error("boundaries {boundaries:?} do not describe {sentences} sentences")]
    InvalidBoundaries {
        boundaries: Vec<usize>,
        sentences: usize,
    },

    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
}

/// Checks that every vector is present and shares one dimension.
///
/// Returns the common dimension (0 for an empty slice).
pub fn check_embeddings(embeddings: &[Vec<f32>]) -> Result<usize, CoreError> {
    let Some(first) = embeddings.first() else {
        return Ok(0);
    };
    let dim = first.len();
    for (index, embedding) in embeddings.iter().enumerate() {
        if embedding.is_empty() {
            return Err(CoreError::MissingEmbedding { index });
        }
        if embedding.len() != dim {
            return Err(CoreError::DimensionMismatch {
                index,
                expected: dim,
                actual: embedding.len(),
            });
        }
    }
    Ok(dim)
}
