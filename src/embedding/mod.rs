// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - turns sentences and dataset items into vectors
//!
//! Providers are swappable behind [`EmbeddingProvider`]; [`CachedProvider`]
//! adds a SQLite cache in front of any of them.

pub mod batch;
pub mod cache;
pub mod provider;

pub use batch::embed_in_batches;
pub use cache::{CachedProvider, EmbeddingCache};
pub use provider::{
    CommandProvider, EmbeddingProvider, EmbeddingProviderConfig, FastEmbedder, HashingEmbedder,
    DEFAULT_HASHING_DIM,
};
