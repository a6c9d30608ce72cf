// SPDX-License-Identifier: MIT OR Apache-2.0

//! Representative election.

use crate::similarity::{centroid, squared_l2};

/// Picks the member closest (squared L2) to the cluster centroid.
///
/// `members` are positions into `embeddings` and `original_indices`. Ties go
/// to the member with the lowest original index. Returns `None` for an empty
/// cluster.
pub fn select_representative(
    members: &[usize],
    embeddings: &[Vec<f32>],
    original_indices: &[usize],
) -> Option<usize> {
    let vectors: Vec<&[f32]> = members.iter().map(|&m| embeddings[m].as_slice()).collect();
    let center = centroid(&vectors);

    members
        .iter()
        .map(|&m| (m, squared_l2(&embeddings[m], &center)))
        .min_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then(original_indices[a.0].cmp(&original_indices[b.0]))
        })
        .map(|(m, _)| m)
}
