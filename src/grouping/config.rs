// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grouping strategy and weighting settings.

use super::weight::WeightFn;
use crate::errors::ConfigError;
use crate::similarity::{cosine_similarity, squared_l2};

pub const DEFAULT_MIN_COSINE: f32 = 0.9;
pub const DEFAULT_TOP_K: usize = 10;
pub const DEFAULT_EPS: f32 = 0.1;
pub const DEFAULT_MIN_SAMPLES: usize = 2;
pub const DEFAULT_SCALE_CONSTANT: f32 = 1.0;
pub const DEFAULT_WEIGHT_CAP: f32 = 5.0;
pub const DEFAULT_SEED: u64 = 42;

/// When two items count as duplicates under the neighbor strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimilarityRule {
    /// Cosine similarity `>= s`.
    MinCosine(f32),
    /// Euclidean distance `<= d` (compared as squared distance `<= d²`).
    MaxL2(f32),
}

impl SimilarityRule {
    pub fn accepts(&self, a: &[f32], b: &[f32]) -> bool {
        match *self {
            SimilarityRule::MinCosine(s) => cosine_similarity(a, b) >= s,
            SimilarityRule::MaxL2(d) => squared_l2(a, b) <= d * d,
        }
    }

    /// Ordering key for neighbor ranking; larger means closer.
    pub fn closeness(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SimilarityRule::MinCosine(_) => cosine_similarity(a, b),
            SimilarityRule::MaxL2(_) => -squared_l2(a, b),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            SimilarityRule::MinCosine(s) if !s.is_finite() || !(-1.0..=1.0).contains(&s) => {
                Err(ConfigError::OutOfRange {
                    name: "min_cosine",
                    value: s,
                    low: -1.0,
                    high: 1.0,
                })
            }
            SimilarityRule::MaxL2(d) if !d.is_finite() || d < 0.0 => Err(ConfigError::OutOfRange {
                name: "max_l2",
                value: d,
                low: 0.0,
                high: f32::MAX,
            }),
            _ => Ok(()),
        }
    }
}

/// Clustering algorithm, fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupingStrategy {
    /// Greedy single pass over items in order, pulling in unassigned
    /// neighbors among each item's `top_k` nearest.
    Neighbor { top_k: usize, rule: SimilarityRule },
    /// DBSCAN over cosine distance.
    Density { eps: f32, min_samples: usize },
}

impl Default for GroupingStrategy {
    fn default() -> Self {
        GroupingStrategy::Neighbor {
            top_k: DEFAULT_TOP_K,
            rule: SimilarityRule::MinCosine(DEFAULT_MIN_COSINE),
        }
    }
}

impl GroupingStrategy {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            GroupingStrategy::Neighbor { top_k, rule } => {
                if *top_k == 0 {
                    return Err(ConfigError::ZeroTopK);
                }
                rule.validate()
            }
            GroupingStrategy::Density { eps, min_samples } => {
                if *min_samples == 0 {
                    return Err(ConfigError::ZeroMinSamples);
                }
                if !eps.is_finite() || !(0.0..=2.0).contains(eps) {
                    return Err(ConfigError::OutOfRange {
                        name: "eps",
                        value: *eps,
                        low: 0.0,
                        high: 2.0,
                    });
                }
                Ok(())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GroupingStrategy::Neighbor { .. } => "neighbor",
            GroupingStrategy::Density { .. } => "density",
        }
    }
}

/// Full configuration of a deduplication run.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupingConfig {
    pub strategy: GroupingStrategy,
    pub weight_fn: WeightFn,
    pub scale_constant: f32,
    pub weight_cap: f32,
    /// Seeds representative sampling.
    pub seed: u64,
    /// Keep at most this many representatives per bucket.
    ///
    /// Overrides the one-representative-per-cluster rule: clusters whose
    /// representative is sampled out are absent from the output records and
    /// survive only in the audit map. `None` keeps every cluster.
    pub max_representatives: Option<usize>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            strategy: GroupingStrategy::default(),
            weight_fn: WeightFn::default(),
            scale_constant: DEFAULT_SCALE_CONSTANT,
            weight_cap: DEFAULT_WEIGHT_CAP,
            seed: DEFAULT_SEED,
            max_representatives: None,
        }
    }
}

impl GroupingConfig {
    pub fn with_strategy(mut self, strategy: GroupingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.strategy.validate()?;
        if !self.scale_constant.is_finite() || self.scale_constant <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "scale_constant",
                value: self.scale_constant,
                low: f32::MIN_POSITIVE,
                high: f32::MAX,
            });
        }
        if !self.weight_cap.is_finite() || self.weight_cap < self.scale_constant {
            return Err(ConfigError::CapBelowScale {
                cap: self.weight_cap,
                scale: self.scale_constant,
            });
        }
        Ok(())
    }
}
