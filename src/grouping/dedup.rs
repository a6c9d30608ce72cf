// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deduplication: cluster items, keep one weighted representative per
//! cluster and record the full membership for audit.

use std::collections::BTreeMap;

use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::config::GroupingConfig;
use super::representative::select_representative;
use super::weight::compute_weight;
use super::group;
use crate::errors::CoreError;

/// One dataset entry to deduplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Position in the original dataset.
    pub index: usize,
    /// Bucket the item is deduplicated within.
    pub bucket: String,
    /// Original fields, carried through untouched.
    pub fields: Map<String, Value>,
    /// `None` or an empty vector when the item could not be embedded.
    pub embedding: Option<Vec<f32>>,
}

impl Item {
    pub fn new(index: usize, fields: Map<String, Value>, embedding: Option<Vec<f32>>) -> Self {
        Self {
            index,
            bucket: String::new(),
            fields,
            embedding,
        }
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = bucket.into();
        self
    }

    fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|e| !e.is_empty())
    }
}

/// A retained representative with its cluster weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DedupRecord {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    pub source_index: usize,
    pub cluster_id: usize,
    pub weight: f32,
}

/// Counters for one bucket (or a whole run, via [`DedupStats::absorb`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub input_items: usize,
    pub skipped: usize,
    pub clusters: usize,
    pub singletons: usize,
    pub largest_cluster: usize,
    pub retained: usize,
    pub sampled_out: usize,
}

impl DedupStats {
    pub fn absorb(&mut self, other: &DedupStats) {
        self.input_items += other.input_items;
        self.skipped += other.skipped;
        self.clusters += other.clusters;
        self.singletons += other.singletons;
        self.largest_cluster = self.largest_cluster.max(other.largest_cluster);
        self.retained += other.retained;
        self.sampled_out += other.sampled_out;
    }
}

/// Result of deduplicating one bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    /// Retained representatives, ordered by cluster id.
    pub records: Vec<DedupRecord>,
    /// Cluster id to the original indices of all its members.
    pub audit: BTreeMap<usize, Vec<usize>>,
    /// Original indices of items without an embedding.
    pub skipped: Vec<usize>,
    pub stats: DedupStats,
}

/// Deduplicates `items` as a single bucket.
pub fn deduplicate(items: Vec<Item>, config: &GroupingConfig) -> Result<DedupOutcome, CoreError> {
    dedup_bucket("", items, config)
}

/// Groups items by [`Item::bucket`] and deduplicates each bucket
/// independently, in parallel. Buckets come back sorted by name.
pub fn deduplicate_buckets(
    items: Vec<Item>,
    config: &GroupingConfig,
) -> Result<BTreeMap<String, DedupOutcome>, CoreError> {
    config.validate()?;

    let mut buckets: BTreeMap<String, Vec<Item>> = BTreeMap::new();
    for item in items {
        buckets.entry(item.bucket.clone()).or_default().push(item);
    }

    let outcomes: Vec<(String, Result<DedupOutcome, CoreError>)> = buckets
        .into_par_iter()
        .map(|(bucket, items)| {
            let outcome = dedup_bucket(&bucket, items, config);
            (bucket, outcome)
        })
        .collect();

    outcomes
        .into_iter()
        .map(|(bucket, outcome)| outcome.map(|o| (bucket, o)))
        .collect()
}

fn dedup_bucket(
    bucket: &str,
    items: Vec<Item>,
    config: &GroupingConfig,
) -> Result<DedupOutcome, CoreError> {
    config.validate()?;

    let input_items = items.len();
    let (embedded, missing): (Vec<Item>, Vec<Item>) =
        items.into_iter().partition(Item::has_embedding);

    let skipped: Vec<usize> = missing.iter().map(|item| item.index).collect();
    if !skipped.is_empty() {
        warn!(
            bucket,
            count = skipped.len(),
            indices = ?skipped,
            "skipping items without embeddings"
        );
    }

    let mut embeddings = Vec::with_capacity(embedded.len());
    let mut indices = Vec::with_capacity(embedded.len());
    let mut fields = Vec::with_capacity(embedded.len());
    for item in embedded {
        indices.push(item.index);
        fields.push(item.fields);
        embeddings.push(item.embedding.unwrap_or_default());
    }

    let clusters = group(&embeddings, &config.strategy)?;
    report_degenerate(bucket, clusters.len(), embeddings.len());

    let mut records = Vec::with_capacity(clusters.len());
    let mut audit = BTreeMap::new();
    let mut stats = DedupStats {
        input_items,
        skipped: skipped.len(),
        clusters: clusters.len(),
        ..DedupStats::default()
    };

    for cluster in &clusters {
        stats.largest_cluster = stats.largest_cluster.max(cluster.len());
        if cluster.is_singleton() {
            stats.singletons += 1;
        }
        audit.insert(
            cluster.id,
            cluster.members.iter().map(|&m| indices[m]).collect(),
        );

        let Some(rep) = select_representative(&cluster.members, &embeddings, &indices) else {
            continue;
        };
        records.push(DedupRecord {
            fields: std::mem::take(&mut fields[rep]),
            source_index: indices[rep],
            cluster_id: cluster.id,
            weight: compute_weight(
                cluster.len(),
                config.weight_fn,
                config.scale_constant,
                config.weight_cap,
            ),
        });
    }

    if let Some(limit) = config.max_representatives {
        if records.len() > limit {
            let before = records.len();
            records = sample_records(records, limit, config.seed, bucket);
            stats.sampled_out = before - records.len();
        }
    }
    stats.retained = records.len();

    debug!(
        bucket,
        items = stats.input_items,
        clusters = stats.clusters,
        retained = stats.retained,
        "deduplicated bucket"
    );

    Ok(DedupOutcome {
        records,
        audit,
        skipped,
        stats,
    })
}

fn report_degenerate(bucket: &str, clusters: usize, items: usize) {
    if items < 2 {
        return;
    }
    if clusters == 1 {
        warn!(bucket, items, "all items collapsed into a single cluster");
    } else if clusters == items {
        warn!(bucket, items, "no duplicates found; every cluster is a singleton");
    }
}

/// Keeps `limit` records chosen by a RNG seeded from `seed` and the bucket
/// name, preserving their relative order.
fn sample_records(
    records: Vec<DedupRecord>,
    limit: usize,
    seed: u64,
    bucket: &str,
) -> Vec<DedupRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ bucket_seed(bucket));
    let mut keep = sample(&mut rng, records.len(), limit).into_vec();
    keep.sort_unstable();

    let mut keep = keep.into_iter().peekable();
    records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| {
            if keep.peek() == Some(&i) {
                keep.next();
                Some(record)
            } else {
                None
            }
        })
        .collect()
}

fn bucket_seed(bucket: &str) -> u64 {
    let hash = blake3::hash(bucket.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
