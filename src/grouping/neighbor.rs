// SPDX-License-Identifier: MIT OR Apache-2.0

//! Greedy neighbor-threshold clustering.
//!
//! Items are visited in ascending position. An unassigned item opens a
//! cluster and absorbs every item among its `top_k` nearest neighbors that
//! passes the similarity rule and is still unassigned. The result depends on
//! input order: an item claimed early cannot join a later, closer cluster.

use rayon::prelude::*;

use super::config::SimilarityRule;

/// The `top_k` nearest other items of every item, closest first.
///
/// Ties in closeness go to the lower position.
pub fn nearest_neighbors(
    embeddings: &[Vec<f32>],
    top_k: usize,
    rule: SimilarityRule,
) -> Vec<Vec<usize>> {
    (0..embeddings.len())
        .into_par_iter()
        .map(|i| {
            let mut ranked: Vec<(usize, f32)> = embeddings
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(j, other)| (j, rule.closeness(&embeddings[i], other)))
                .collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
            ranked.truncate(top_k);
            ranked.into_iter().map(|(j, _)| j).collect()
        })
        .collect()
}

/// Partitions positions `0..n` into clusters, each sorted ascending.
pub fn neighbor_clusters(
    embeddings: &[Vec<f32>],
    top_k: usize,
    rule: SimilarityRule,
) -> Vec<Vec<usize>> {
    let neighbors = nearest_neighbors(embeddings, top_k, rule);
    let mut assigned = vec![false; embeddings.len()];
    let mut clusters = Vec::new();

    for i in 0..embeddings.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let mut members = vec![i];

        for &j in &neighbors[i] {
            if !assigned[j] && rule.accepts(&embeddings[i], &embeddings[j]) {
                assigned[j] = true;
                members.push(j);
            }
        }

        members.sort_unstable();
        clusters.push(members);
    }

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
    fn neighbors_ranked_by_closeness_then_position() {
        let embeddings = vec![unit(0.0), unit(30.0), unit(-30.0), unit(90.0)];
        let neighbors = nearest_neighbors(&embeddings, 2, SimilarityRule::MinCosine(0.0));
        assert_eq!(neighbors[0], vec![1, 2]);
        assert_eq!(neighbors[3], vec![1, 0]);
    }

    #[test]
    fn assignment_is_order_dependent() {
        let rule = SimilarityRule::MinCosine(0.9);
        let (a, b, c) = (unit(0.0), unit(20.0), unit(40.0));

        // A first: A claims B, C is left alone.
        let abc = vec![a.clone(), b.clone(), c.clone()];
        assert_eq!(neighbor_clusters(&abc, 5, rule), vec![vec![0, 1], vec![2]]);

        // B first: B is within threshold of both and claims them.
        let bac = vec![b, a, c];
        assert_eq!(neighbor_clusters(&bac, 5, rule), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn top_k_limits_reach() {
        let embeddings = vec![unit(0.0), unit(1.0), unit(10.0), unit(12.0)];
        let rule = SimilarityRule::MinCosine(0.9);
        assert_eq!(
            neighbor_clusters(&embeddings, 1, rule),
            vec![vec![0, 1], vec![2, 3]]
        );
        assert_eq!(neighbor_clusters(&embeddings, 10, rule), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn l2_rule() {
        let embeddings = vec![vec![0.0, 0.0], vec![0.5, 0.0], vec![3.0, 0.0]];
        let clusters = neighbor_clusters(&embeddings, 10, SimilarityRule::MaxL2(0.5));
        assert_eq!(clusters, vec![vec![0, 1], vec![2]]);
    }
}
