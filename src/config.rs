// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for qadistill
//!
//! Loads configuration from .qadistillrc.toml in current directory or
//! ~/.config/qadistill/config.toml

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chunking::config::{
    ChunkingConfig, DEFAULT_MAX_TOKENS, DEFAULT_MIN_TOKENS, DEFAULT_OVERLAP_SIZE,
    DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TARGET_CHUNK_SIZE,
};
use crate::embedding::{
    CachedProvider, CommandProvider, EmbeddingCache, EmbeddingProvider, EmbeddingProviderConfig,
    FastEmbedder, HashingEmbedder, DEFAULT_HASHING_DIM,
};
use crate::errors::ConfigError;
use crate::grouping::config::{
    DEFAULT_EPS, DEFAULT_MIN_COSINE, DEFAULT_MIN_SAMPLES, DEFAULT_SCALE_CONSTANT, DEFAULT_SEED,
    DEFAULT_TOP_K, DEFAULT_WEIGHT_CAP,
};
use crate::grouping::{GroupingConfig, GroupingStrategy, SimilarityRule, WeightFn};
use crate::text::TokenizerKind;

/// Default Euclidean radius for the `l2` metric. On unit vectors this is
/// roughly a cosine similarity of 0.9.
pub const DEFAULT_MAX_L2: f32 = 0.45;

/// Default embedding batch size.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Clustering algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Neighbor,
    Density,
}

/// Duplicate rule for the neighbor strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    #[default]
    Cosine,
    L2,
}

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    #[default]
    Builtin,
    Command,
    Hashing,
}

/// `[chunking]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChunkingSection {
    /// Adjacent cosine similarity below which a segment breaks
    pub similarity_threshold: Option<f32>,
    pub min_tokens: Option<usize>,
    pub max_tokens: Option<usize>,
    pub target_chunk_size: Option<usize>,
    /// Sentences repeated at the start of the next chunk
    pub overlap_size: Option<usize>,
    /// Token counter (cl100k, words)
    pub tokenizer: Option<TokenizerKind>,
}

impl ChunkingSection {
    pub fn similarity_threshold(&self) -> f32 {
        self.similarity_threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD)
    }

    pub fn min_tokens(&self) -> usize {
        self.min_tokens.unwrap_or(DEFAULT_MIN_TOKENS)
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn target_chunk_size(&self) -> usize {
        self.target_chunk_size.unwrap_or(DEFAULT_TARGET_CHUNK_SIZE)
    }

    pub fn overlap_size(&self) -> usize {
        self.overlap_size.unwrap_or(DEFAULT_OVERLAP_SIZE)
    }

    /// Get tokenizer (defaults to cl100k)
    pub fn tokenizer(&self) -> TokenizerKind {
        self.tokenizer.unwrap_or_default()
    }

    /// Builds a validated runtime config.
    pub fn to_config(&self) -> Result<ChunkingConfig, ConfigError> {
        let config = ChunkingConfig {
            similarity_threshold: self.similarity_threshold(),
            min_tokens: self.min_tokens(),
            max_tokens: self.max_tokens(),
            target_chunk_size: self.target_chunk_size(),
            overlap_size: self.overlap_size(),
        };
        config.validate()?;
        Ok(config)
    }
}

/// `[grouping]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GroupingSection {
    /// Clustering algorithm (neighbor, density)
    pub strategy: Option<StrategyKind>,
    /// Neighbor duplicate rule (cosine, l2)
    pub metric: Option<MetricKind>,
    pub min_cosine: Option<f32>,
    pub max_l2: Option<f32>,
    pub top_k: Option<usize>,
    /// DBSCAN radius in cosine distance
    pub eps: Option<f32>,
    pub min_samples: Option<usize>,
    pub weight_fn: Option<WeightFn>,
    pub scale_constant: Option<f32>,
    pub weight_cap: Option<f32>,
    pub seed: Option<u64>,
    /// Cap on retained representatives per bucket
    pub max_representatives: Option<usize>,
}

impl GroupingSection {
    pub fn strategy(&self) -> StrategyKind {
        self.strategy.unwrap_or_default()
    }

    pub fn metric(&self) -> MetricKind {
        self.metric.unwrap_or_default()
    }

    pub fn min_cosine(&self) -> f32 {
        self.min_cosine.unwrap_or(DEFAULT_MIN_COSINE)
    }

    pub fn max_l2(&self) -> f32 {
        self.max_l2.unwrap_or(DEFAULT_MAX_L2)
    }

    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(DEFAULT_TOP_K)
    }

    pub fn eps(&self) -> f32 {
        self.eps.unwrap_or(DEFAULT_EPS)
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples.unwrap_or(DEFAULT_MIN_SAMPLES)
    }

    pub fn weight_fn(&self) -> WeightFn {
        self.weight_fn.unwrap_or_default()
    }

    pub fn scale_constant(&self) -> f32 {
        self.scale_constant.unwrap_or(DEFAULT_SCALE_CONSTANT)
    }

    pub fn weight_cap(&self) -> f32 {
        self.weight_cap.unwrap_or(DEFAULT_WEIGHT_CAP)
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Builds a validated runtime config.
    pub fn to_config(&self) -> Result<GroupingConfig, ConfigError> {
        let strategy = match self.strategy() {
            StrategyKind::Neighbor => GroupingStrategy::Neighbor {
                top_k: self.top_k(),
                rule: match self.metric() {
                    MetricKind::Cosine => SimilarityRule::MinCosine(self.min_cosine()),
                    MetricKind::L2 => SimilarityRule::MaxL2(self.max_l2()),
                },
            },
            StrategyKind::Density => GroupingStrategy::Density {
                eps: self.eps(),
                min_samples: self.min_samples(),
            },
        };
        let config = GroupingConfig {
            strategy,
            weight_fn: self.weight_fn(),
            scale_constant: self.scale_constant(),
            weight_cap: self.weight_cap(),
            seed: self.seed(),
            max_representatives: self.max_representatives,
        };
        config.validate()?;
        Ok(config)
    }
}

/// `[embeddings]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    /// Provider type (builtin, command, hashing)
    pub provider: Option<EmbeddingProviderType>,
    /// Model identifier for the provider
    pub model: Option<String>,
    /// Command to execute for command provider
    pub command: Option<String>,
    pub batch_size: Option<usize>,
    /// Vector size for the hashing provider
    pub dimension: Option<usize>,
    /// SQLite cache location; caching is off when unset
    pub cache_path: Option<PathBuf>,
}

impl EmbeddingSection {
    /// Get provider type (defaults to Builtin)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get command (defaults to "embedder")
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or("embedder")
    }

    /// Get model identifier for the command provider (defaults to "local-model-id")
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or("local-model-id")
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn dimension(&self) -> usize {
        self.dimension.unwrap_or(DEFAULT_HASHING_DIM)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size() == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Instantiates the configured provider, behind a cache when
    /// `cache_path` is set.
    pub fn build_provider(&self) -> Result<Box<dyn EmbeddingProvider>> {
        self.validate()?;

        let provider: Box<dyn EmbeddingProvider> = match self.provider() {
            EmbeddingProviderType::Builtin => {
                let config =
                    EmbeddingProviderConfig::resolve(self.model.as_deref(), self.batch_size)?;
                Box::new(FastEmbedder::new(config)?)
            }
            EmbeddingProviderType::Command => Box::new(
                CommandProvider::new(self.command().to_string(), self.model().to_string())
                    .with_batch_size(self.batch_size()),
            ),
            EmbeddingProviderType::Hashing => Box::new(
                HashingEmbedder::new(self.dimension()).with_batch_size(self.batch_size()),
            ),
        };

        match &self.cache_path {
            Some(path) => {
                let cache = EmbeddingCache::open(path)?;
                Ok(Box::new(CachedProvider::new(provider, cache)))
            }
            None => Ok(provider),
        }
    }
}

/// Configuration loaded from .qadistillrc.toml or ~/.config/qadistill/config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chunking configuration
    pub chunking: ChunkingSection,

    /// Grouping and weighting configuration
    pub grouping: GroupingSection,

    /// Embedding configuration
    pub embeddings: EmbeddingSection,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .qadistillrc.toml in current directory
    /// 2. ~/.config/qadistill/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(".qadistillrc.toml")) {
            return config;
        }

        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config").join("qadistill").join("config.toml");
            if let Some(config) = Self::load_from_path(&config_path) {
                return config;
            }
        }

        Self::default()
    }

    /// Loads an explicitly requested file, or falls back to [`Config::load`].
    ///
    /// Unlike the implicit locations, a missing or malformed explicit file is
    /// an error.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load_from(path),
            None => Ok(Self::load()),
        }
    }

    /// Parses the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config");
                None
            }
        }
    }
}
