// SPDX-License-Identifier: MIT OR Apache-2.0

//! Similarity grouping of embedded items.
//!
//! [`group`] partitions items into clusters with the configured
//! [`GroupingStrategy`]; [`dedup`] then keeps one weighted representative
//! per cluster.

pub mod config;
pub mod dedup;
pub mod density;
pub mod neighbor;
pub mod representative;
pub mod weight;

pub use config::{GroupingConfig, GroupingStrategy, SimilarityRule};
pub use dedup::{deduplicate, deduplicate_buckets, DedupOutcome, DedupRecord, DedupStats, Item};
pub use representative::select_representative;
pub use weight::{compute_weight, WeightFn};

use tracing::debug;

use crate::errors::{check_embeddings, CoreError};

/// A set of item positions grouped together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Ids follow the order of each cluster's lowest member.
    pub id: usize,
    /// Ascending positions.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_singleton(&self) -> bool {
        self.members.len() == 1
    }
}

/// Partitions positions `0..embeddings.len()` into clusters.
pub fn group(
    embeddings: &[Vec<f32>],
    strategy: &GroupingStrategy,
) -> Result<Vec<Cluster>, CoreError> {
    strategy.validate()?;
    check_embeddings(embeddings)?;

    let raw = match *strategy {
        GroupingStrategy::Neighbor { top_k, rule } => {
            neighbor::neighbor_clusters(embeddings, top_k, rule)
        }
        GroupingStrategy::Density { eps, min_samples } => {
            density::density_clusters(embeddings, eps, min_samples)
        }
    };

    let clusters = label_clusters(raw);
    debug!(
        strategy = strategy.name(),
        items = embeddings.len(),
        clusters = clusters.len(),
        "grouped items"
    );
    Ok(clusters)
}

/// Sorts members, orders clusters by lowest member, and assigns ids.
fn label_clusters(mut raw: Vec<Vec<usize>>) -> Vec<Cluster> {
    raw.retain(|members| !members.is_empty());
    for members in raw.iter_mut() {
        members.sort_unstable();
    }
    raw.sort_by_key(|members| members[0]);
    raw.into_iter()
        .enumerate()
        .map(|(id, members)| Cluster { id, members })
        .collect()
}
