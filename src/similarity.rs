// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector similarity helpers used by both the boundary detector and the
//! grouping engine.

/// Cosine similarity between two vectors, clamped to `[-1, 1]`.
///
/// Returns 0.0 when either vector has zero magnitude or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    (dot_product / (magnitude_a * magnitude_b)).clamp(-1.0, 1.0)
}

/// `1 - cosine_similarity`, in `[0, 2]`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Squared Euclidean distance.
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Mean vector of the given members. Empty input yields an empty vector.
pub fn centroid(vectors: &[&[f32]]) -> Vec<f32> {
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let mut out = vec![0.0; first.len()];

    for v in vectors {
        for (acc, value) in out.iter_mut().zip(v.iter()) {
            *acc += value;
        }
    }

    let n = vectors.len() as f32;
    for value in out.iter_mut() {
        *value /= n;
    }

    out
}

/// Adjacent cosine similarities `sim(i, i+1)` for `i in 0..n-1`.
pub fn adjacent_similarities(embeddings: &[Vec<f32>]) -> Vec<f32> {
    embeddings
        .windows(2)
        .map(|pair| cosine_similarity(&pair[0], &pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn cosine_is_symmetric_and_bounded() {
        let a = vec![1.0, 2.0, -3.0];
        let b = vec![-1.0, -2.0, 3.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
        assert!(cosine_similarity(&a, &b) >= -1.0);
    }

    #[test]
    fn cosine_handles_zero_and_mismatched_vectors() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn squared_l2_matches_hand_computation() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }

    #[test]
    fn centroid_is_componentwise_mean() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let c = centroid(&[&a, &b]);
        assert_eq!(c, vec![0.5, 0.5]);
        assert!(centroid(&[]).is_empty());
    }

    #[test]
    fn adjacent_similarities_has_n_minus_one_entries() {
        let e = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        let sims = adjacent_similarities(&e);
        assert_eq!(sims.len(), 2);
        assert!((sims[0] - 1.0).abs() < 1e-6);
        assert!(sims[1].abs() < 1e-6);
        assert!(adjacent_similarities(&[]).is_empty());
    }
}
