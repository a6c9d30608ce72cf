// SPDX-License-Identifier: MIT OR Apache-2.0

use qadistill::grouping::{
    compute_weight, deduplicate, group, GroupingConfig, GroupingStrategy, Item, SimilarityRule,
    WeightFn,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Map};

/// Points scattered around a few random centers, so that real clusters exist.
fn clustered_embeddings(rng: &mut ChaCha8Rng, count: usize, dim: usize) -> Vec<Vec<f32>> {
    let centers: Vec<Vec<f32>> = (0..4)
        .map(|_| (0..dim).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect();
    (0..count)
        .map(|_| {
            let center = &centers[rng.gen_range(0..centers.len())];
            center
                .iter()
                .map(|v| v + rng.gen_range(-0.05f32..0.05))
                .collect()
        })
        .collect()
}

fn strategies() -> Vec<GroupingStrategy> {
    vec![
        GroupingStrategy::Neighbor {
            top_k: 5,
            rule: SimilarityRule::MinCosine(0.9),
        },
        GroupingStrategy::Neighbor {
            top_k: 50,
            rule: SimilarityRule::MaxL2(0.45),
        },
        GroupingStrategy::Density {
            eps: 0.1,
            min_samples: 2,
        },
        GroupingStrategy::Density {
            eps: 0.05,
            min_samples: 4,
        },
    ]
}

#[test]
fn clusters_partition_every_item_exactly_once() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    for round in 0..20 {
        let count = rng.gen_range(1..60);
        let embeddings = clustered_embeddings(&mut rng, count, 6);

        for strategy in strategies() {
            let clusters = group(&embeddings, &strategy).expect("group");

            let mut seen = vec![0usize; count];
            for (expected_id, cluster) in clusters.iter().enumerate() {
                assert_eq!(cluster.id, expected_id, "round {round}");
                assert!(!cluster.is_empty());
                assert!(cluster.members.windows(2).all(|w| w[0] < w[1]));
                for &m in &cluster.members {
                    seen[m] += 1;
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "round {round}: {strategy:?}");

            let firsts: Vec<usize> = clusters.iter().map(|c| c.members[0]).collect();
            assert!(firsts.windows(2).all(|w| w[0] < w[1]), "round {round}");
        }
    }
}

#[test]
fn retained_weights_are_bounded_and_account_for_every_item() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);

    for weight_fn in [WeightFn::Sqrt, WeightFn::Log] {
        for round in 0..10 {
            let count = rng.gen_range(1..40);
            let items: Vec<Item> = clustered_embeddings(&mut rng, count, 4)
                .into_iter()
                .enumerate()
                .map(|(i, e)| {
                    let mut fields = Map::new();
                    fields.insert("id".to_string(), json!(i));
                    Item::new(i, fields, Some(e))
                })
                .collect();

            let config = GroupingConfig {
                weight_fn,
                scale_constant: 1.0,
                weight_cap: 3.0,
                ..GroupingConfig::default()
            };
            let outcome = deduplicate(items, &config).expect("dedup");

            assert_eq!(outcome.records.len(), outcome.audit.len(), "round {round}");
            let members: usize = outcome.audit.values().map(Vec::len).sum();
            assert_eq!(members, count);

            for record in &outcome.records {
                let size = outcome.audit[&record.cluster_id].len();
                assert!(record.weight >= 1.0 && record.weight <= 3.0);
                assert_eq!(record.weight, compute_weight(size, weight_fn, 1.0, 3.0));
                assert!(outcome.audit[&record.cluster_id].contains(&record.source_index));
                assert_eq!(record.fields["id"], json!(record.source_index));
            }
        }
    }
}

#[test]
fn weight_grows_with_cluster_size_until_the_cap() {
    for weight_fn in [WeightFn::Sqrt, WeightFn::Log] {
        assert_eq!(compute_weight(1, weight_fn, 1.0, 5.0), 1.0);

        let weights: Vec<f32> = (1..200)
            .map(|n| compute_weight(n, weight_fn, 1.0, 5.0))
            .collect();
        assert!(weights.windows(2).all(|w| w[0] <= w[1]));
        assert!(weights.iter().all(|&w| w <= 5.0));
    }
    assert_eq!(compute_weight(100, WeightFn::Sqrt, 1.0, 5.0), 5.0);
    assert!(
        compute_weight(100, WeightFn::Log, 1.0, 10.0)
            < compute_weight(100, WeightFn::Sqrt, 1.0, 10.0)
    );
}
