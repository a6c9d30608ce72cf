// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-size batching on top of any provider.

use anyhow::Result;

use super::provider::EmbeddingProvider;
use crate::errors::CoreError;

/// Embeds `texts` in batches of `provider.batch_size()`, preserving order.
///
/// `on_batch` is called with the number of texts finished after each batch.
pub fn embed_in_batches<P, F>(
    provider: &mut P,
    texts: &[String],
    mut on_batch: F,
) -> Result<Vec<Vec<f32>>>
where
    P: EmbeddingProvider + ?Sized,
    F: FnMut(usize),
{
    let batch_size = provider.batch_size().max(1);
    let mut vectors = Vec::with_capacity(texts.len());

    for batch in texts.chunks(batch_size) {
        let embedded = provider.embed_texts(batch)?;
        if embedded.len() != batch.len() {
            return Err(CoreError::EmbeddingCountMismatch {
                expected: batch.len(),
                actual: embedded.len(),
            }
            .into());
        }
        vectors.extend(embedded);
        on_batch(vectors.len());
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;

    struct ShortProvider;

    impl EmbeddingProvider for ShortProvider {
        fn model_id(&self) -> &str {
            "short"
        }

        fn batch_size(&self) -> usize {
            2
        }

        fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().skip(1).map(|_| vec![1.0]).collect())
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text number {}", i)).collect()
    }

    #[test]
    fn batch_size_does_not_change_vectors() {
        let input = texts(7);
        let mut whole = HashingEmbedder::new(16).with_batch_size(100);
        let mut small = HashingEmbedder::new(16).with_batch_size(3);

        let mut progress = Vec::new();
        let a = embed_in_batches(&mut whole, &input, |_| {}).unwrap();
        let b = embed_in_batches(&mut small, &input, |done| progress.push(done)).unwrap();

        assert_eq!(a, b);
        assert_eq!(progress, vec![3, 6, 7]);
    }

    #[test]
    fn short_batch_is_an_error() {
        let err = embed_in_batches(&mut ShortProvider, &texts(2), |_| {}).unwrap_err();
        assert!(err.to_string().contains("expected 2 embeddings, got 1"));
    }

    #[test]
    fn empty_input_skips_provider() {
        let out = embed_in_batches(&mut ShortProvider, &[], |_| {}).unwrap();
        assert!(out.is_empty());
    }
}
