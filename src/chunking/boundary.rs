// SPDX-License-Identifier: MIT OR Apache-2.0

//! Segment boundaries from adjacent sentence similarity.
//!
//! ```text
//! sentences:     s0     s1     s2     s3
//! similarities:     0.95   0.40   0.88        threshold = 0.5
//! boundaries:    0             2          4
//! segments:      [s0 s1]       [s2 s3]
//! ```

use std::ops::Range;

use crate::errors::{check_embeddings, CoreError};
use crate::similarity::adjacent_similarities;

/// Returns `[0, b1, ..., n]` where a boundary `i + 1` is placed whenever
/// `similarity(i, i + 1) < similarity_threshold`.
///
/// An empty input yields an empty list. Identical adjacent embeddings are
/// never split, since their similarity cannot fall below 1.0.
pub fn detect_boundaries(
    embeddings: &[Vec<f32>],
    similarity_threshold: f32,
) -> Result<Vec<usize>, CoreError> {
    check_embeddings(embeddings)?;

    let n = embeddings.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let mut boundaries = vec![0];
    for (i, similarity) in adjacent_similarities(embeddings).into_iter().enumerate() {
        if similarity < similarity_threshold {
            boundaries.push(i + 1);
        }
    }
    boundaries.push(n);

    Ok(boundaries)
}

/// Sentence ranges between adjacent boundaries.
pub fn segments(boundaries: &[usize]) -> impl Iterator<Item = Range<usize>> + '_ {
    boundaries.windows(2).map(|pair| pair[0]..pair[1])
}

/// True when `boundaries` is a strictly increasing list from 0 to `sentences`.
pub fn is_valid(boundaries: &[usize], sentences: usize) -> bool {
    if sentences == 0 {
        return boundaries.is_empty();
    }
    boundaries.first() == Some(&0)
        && boundaries.last() == Some(&sentences)
        && boundaries.windows(2).all(|pair| pair[0] < pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(angle_deg: f32) -> Vec<f32> {
        let rad = angle_deg.to_radians();
        vec![rad.cos(), rad.sin()]
    }

    #[test]
    fn empty_input_has_no_boundaries() {
        assert!(detect_boundaries(&[], 0.5).unwrap().is_empty());
    }

    #[test]
    fn single_sentence_is_one_segment() {
        assert_eq!(detect_boundaries(&[unit(0.0)], 0.5).unwrap(), vec![0, 1]);
    }

    #[test]
    fn boundary_after_similarity_drop() {
        // cos(10deg) ~ 0.985, cos(80deg) ~ 0.17
        let embeddings = vec![unit(0.0), unit(10.0), unit(90.0), unit(95.0)];
        let boundaries = detect_boundaries(&embeddings, 0.5).unwrap();
        assert_eq!(boundaries, vec![0, 2, 4]);

        let spans: Vec<_> = segments(&boundaries).collect();
        assert_eq!(spans, vec![0..2, 2..4]);
    }

    #[test]
    fn comparison_is_strict() {
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0]];
        // similarity equal to the threshold keeps sentences together
        let sim = crate::similarity::cosine_similarity(&embeddings[0], &embeddings[1]);
        assert_eq!(detect_boundaries(&embeddings, sim).unwrap(), vec![0, 2]);
    }

    #[test]
    fn threshold_one_splits_every_distinct_sentence() {
        let embeddings: Vec<_> = (0..5).map(|i| unit(i as f32 * 7.0)).collect();
        assert_eq!(
            detect_boundaries(&embeddings, 1.0).unwrap(),
            vec![0, 1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn threshold_one_keeps_identical_neighbours_together() {
        // e.g. "See above." repeated twice before an unrelated sentence
        let embeddings = vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(detect_boundaries(&embeddings, 1.0).unwrap(), vec![0, 2, 3]);
    }

    #[test]
    fn threshold_minus_one_never_splits() {
        let embeddings = vec![unit(0.0), unit(180.0), unit(90.0), unit(270.0)];
        assert_eq!(detect_boundaries(&embeddings, -1.0).unwrap(), vec![0, 4]);
    }

    #[test]
    fn placeholder_embedding_is_rejected() {
        let embeddings = vec![unit(0.0), Vec::new()];
        assert_eq!(
            detect_boundaries(&embeddings, 0.5),
            Err(CoreError::MissingEmbedding { index: 1 })
        );
    }

    #[test]
    fn validity_check() {
        assert!(is_valid(&[0, 2, 4], 4));
        assert!(is_valid(&[], 0));
        assert!(!is_valid(&[0, 2, 2, 4], 4));
        assert!(!is_valid(&[1, 4], 4));
        assert!(!is_valid(&[0, 3], 4));
    }
}
