// SPDX-License-Identifier: MIT OR Apache-2.0

//! DBSCAN over cosine distance.
//!
//! Noise points are returned as singleton clusters so the output is always a
//! full partition.

use std::collections::VecDeque;

use rayon::prelude::*;

use crate::similarity::cosine_distance;

/// Partitions positions `0..n` into clusters, each sorted ascending.
///
/// `min_samples` counts the point itself. A border point joins the first
/// cluster that reaches it.
pub fn density_clusters(
    embeddings: &[Vec<f32>],
    eps: f32,
    min_samples: usize,
) -> Vec<Vec<usize>> {
    let n = embeddings.len();
    if n == 0 {
        return Vec::new();
    }

    let neighbors: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .filter(|&j| cosine_distance(&embeddings[i], &embeddings[j]) <= eps)
                .collect()
        })
        .collect();

    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut cluster_count = 0;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        // Not core; may still be claimed as a border point later.
        if neighbors[i].len() < min_samples {
            continue;
        }

        let cluster = cluster_count;
        cluster_count += 1;
        labels[i] = Some(cluster);

        let mut queue: VecDeque<usize> =
            neighbors[i].iter().copied().filter(|&j| j != i).collect();

        while let Some(j) = queue.pop_front() {
            if labels[j].is_none() {
                labels[j] = Some(cluster);
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;

            if neighbors[j].len() >= min_samples {
                queue.extend(neighbors[j].iter().copied().filter(|&k| labels[k].is_none()));
            }
        }
    }

    let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
    let mut noise = Vec::new();
    for (position, label) in labels.into_iter().enumerate() {
        match label {
            Some(c) => clusters[c].push(position),
            None => noise.push(vec![position]),
        }
    }
    clusters.extend(noise);
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(angle_deg: f32) -> Vec<f32> {
        let rad = angle_deg.to_radians();
        vec![rad.cos(), rad.sin()]
    }

    #[test]
    fn empty_input() {
        assert!(density_clusters(&[], 0.1, 2).is_empty());
    }

    #[test]
    fn single_point_is_noise_singleton() {
        assert_eq!(density_clusters(&[unit(0.0)], 0.1, 2), vec![vec![0]]);
    }

    #[test]
    fn two_groups_and_an_outlier() {
        let embeddings = vec![
            unit(0.0),
            unit(2.0),
            unit(90.0),
            unit(4.0),
            unit(180.0),
            unit(92.0),
        ];
        let mut clusters = density_clusters(&embeddings, 0.01, 2);
        clusters.sort();
        assert_eq!(clusters, vec![vec![0, 1, 3], vec![2, 5], vec![4]]);
    }

    #[test]
    fn chains_through_core_points() {
        // Consecutive points are 5 degrees apart; eps covers one hop only.
        let embeddings: Vec<_> = (0..5).map(|i| unit(i as f32 * 5.0)).collect();
        let eps = 1.0 - 6f32.to_radians().cos();
        assert_eq!(density_clusters(&embeddings, eps, 2), vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn min_samples_one_makes_every_point_core() {
        let embeddings = vec![unit(0.0), unit(90.0)];
        let clusters = density_clusters(&embeddings, 0.0001, 1);
        assert_eq!(clusters, vec![vec![0], vec![1]]);
    }
}
