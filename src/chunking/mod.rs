// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic chunking of documents.
//!
//! A document is split into sentences, each sentence is embedded, and
//! adjacent similarity decides where segments break
//! ([`boundary::detect_boundaries`]). Segments are then packed into
//! token-bounded chunks by [`assembler::assemble_chunks`].

pub mod assembler;
pub mod boundary;
pub mod config;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

pub use assembler::{assemble_chunks, Accumulator, Assembler, Chunk, Step};
pub use boundary::detect_boundaries;
pub use config::ChunkingConfig;

use crate::embedding::{embed_in_batches, EmbeddingProvider};
use crate::errors::{ConfigError, CoreError};
use crate::text::{SentenceSegmenter, TokenCounter};

/// Summary of one chunked document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChunkStats {
    pub chunk_count: usize,
    pub sentence_count: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub mean_tokens: f32,
}

impl ChunkStats {
    pub fn from_chunks(chunks: &[Chunk], sentence_count: usize) -> Self {
        if chunks.is_empty() {
            return Self {
                sentence_count,
                ..Self::default()
            };
        }
        let total: usize = chunks.iter().map(|c| c.token_count).sum();
        Self {
            chunk_count: chunks.len(),
            sentence_count,
            min_tokens: chunks.iter().map(|c| c.token_count).min().unwrap_or(0),
            max_tokens: chunks.iter().map(|c| c.token_count).max().unwrap_or(0),
            mean_tokens: total as f32 / chunks.len() as f32,
        }
    }
}

/// Chunks of one document, in order.
#[derive(Debug, Clone)]
pub struct ChunkedDocument {
    pub title: String,
    pub chunks: Vec<Chunk>,
    pub stats: ChunkStats,
}

/// A document whose sentences are already embedded.
#[derive(Debug, Clone)]
pub struct PreparedDocument {
    pub title: String,
    pub sentences: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
}

/// Sentence segmenter, tokenizer and budgets bundled for a run.
pub struct SemanticChunker {
    config: ChunkingConfig,
    segmenter: Box<dyn SentenceSegmenter>,
    tokenizer: Box<dyn TokenCounter>,
}

impl SemanticChunker {
    pub fn new(
        config: ChunkingConfig,
        segmenter: Box<dyn SentenceSegmenter>,
        tokenizer: Box<dyn TokenCounter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            segmenter,
            tokenizer,
        })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> &dyn TokenCounter {
        self.tokenizer.as_ref()
    }

    /// Splits `text` into sentences and embeds them.
    pub fn prepare<P>(&self, title: &str, text: &str, provider: &mut P) -> Result<PreparedDocument>
    where
        P: EmbeddingProvider + ?Sized,
    {
        let sentences = self.segmenter.segment(text);
        let embeddings = embed_in_batches(provider, &sentences, |_| {})
            .with_context(|| format!("Failed to embed sentences of '{}'", title))?;
        Ok(PreparedDocument {
            title: title.to_string(),
            sentences,
            embeddings,
        })
    }

    /// Chunks pre-embedded sentences.
    pub fn chunk_sentences(
        &self,
        sentences: &[String],
        embeddings: &[Vec<f32>],
    ) -> Result<Vec<Chunk>, CoreError> {
        if sentences.len() != embeddings.len() {
            return Err(CoreError::EmbeddingCountMismatch {
                expected: sentences.len(),
                actual: embeddings.len(),
            });
        }
        let boundaries = detect_boundaries(embeddings, self.config.similarity_threshold)?;
        assemble_chunks(sentences, &boundaries, &self.config, self.tokenizer.as_ref())
    }

    pub fn chunk_prepared(
        &self,
        document: &PreparedDocument,
    ) -> Result<ChunkedDocument, CoreError> {
        let chunks = self.chunk_sentences(&document.sentences, &document.embeddings)?;
        let stats = ChunkStats::from_chunks(&chunks, document.sentences.len());
        debug!(
            title = %document.title,
            sentences = stats.sentence_count,
            chunks = stats.chunk_count,
            "chunked document"
        );
        Ok(ChunkedDocument {
            title: document.title.clone(),
            chunks,
            stats,
        })
    }

    /// Segments, embeds and chunks a single document.
    pub fn chunk_document<P>(
        &self,
        title: &str,
        text: &str,
        provider: &mut P,
    ) -> Result<ChunkedDocument>
    where
        P: EmbeddingProvider + ?Sized,
    {
        let prepared = self.prepare(title, text, provider)?;
        self.chunk_prepared(&prepared)
            .with_context(|| format!("Failed to chunk '{}'", title))
    }

    /// Chunks many prepared documents in parallel; results keep input order.
    pub fn chunk_prepared_batch(
        &self,
        documents: &[PreparedDocument],
    ) -> Vec<Result<ChunkedDocument, CoreError>> {
        documents
            .par_iter()
            .map(|document| self.chunk_prepared(document))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::text::{UnicodeSentenceSegmenter, WordCounter};

    fn chunker(config: ChunkingConfig) -> SemanticChunker {
        SemanticChunker::new(
            config,
            Box::new(UnicodeSentenceSegmenter),
            Box::new(WordCounter),
        )
        .unwrap()
    }

    #[test]
    fn test_three_sentence_document() {
        // Two related sentences then an unrelated one; with a high token
        // budget everything lands in a single chunk.
        let sentences: Vec<String> = vec![
            "The cat sat.".into(),
            "The cat slept.".into(),
            "Stocks fell sharply.".into(),
        ];
        let embeddings = vec![vec![1.0, 0.0], vec![0.98, 0.2], vec![0.0, 1.0]];
        let config = ChunkingConfig::new(0.9, 1, 1000, 1000).unwrap();

        let chunks = chunker(config)
            .chunk_sentences(&sentences, &embeddings)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "The cat sat. The cat slept. Stocks fell sharply.");
    }

    #[test]
    fn test_embedding_count_must_match() {
        let sentences: Vec<String> = vec!["One.".into(), "Two.".into()];
        let result = chunker(ChunkingConfig::default()).chunk_sentences(&sentences, &[vec![1.0]]);
        assert_eq!(
            result,
            Err(CoreError::EmbeddingCountMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_chunk_document_end_to_end() {
        let text = "Rust has ownership. Ownership moves values. Borrowing lends values. \
                    Bread needs flour. Flour comes from wheat.";
        let config = ChunkingConfig::new(0.5, 2, 20, 10).unwrap();
        let mut provider = HashingEmbedder::default();

        let document = chunker(config)
            .chunk_document("notes", text, &mut provider)
            .unwrap();

        assert_eq!(document.title, "notes");
        assert_eq!(document.stats.sentence_count, 5);
        assert!(document.stats.chunk_count >= 1);
        let last = document.chunks.last().unwrap();
        assert_eq!(last.end_sentence, 5);
    }

    #[test]
    fn test_empty_document_has_no_chunks() {
        let mut provider = HashingEmbedder::default();
        let document = chunker(ChunkingConfig::default())
            .chunk_document("blank", "   \n\n ", &mut provider)
            .unwrap();
        assert!(document.chunks.is_empty());
        assert_eq!(document.stats, ChunkStats::default());
    }

    #[test]
    fn test_batch_keeps_order() {
        let chunker = chunker(ChunkingConfig::new(0.5, 1, 50, 25).unwrap());
        let mut provider = HashingEmbedder::default();
        let docs: Vec<_> = (0..4)
            .map(|i| {
                chunker
                    .prepare(&format!("doc{}", i), "A short sentence. Another one.", &mut provider)
                    .unwrap()
            })
            .collect();

        let titles: Vec<_> = chunker
            .chunk_prepared_batch(&docs)
            .into_iter()
            .map(|r| r.unwrap().title)
            .collect();
        assert_eq!(titles, vec!["doc0", "doc1", "doc2", "doc3"]);
    }

    #[test]
    fn test_stats() {
        let chunks = vec![
            Chunk {
                text: "a b".into(),
                token_count: 2,
                start_sentence: 0,
                end_sentence: 1,
                overlap_sentences: 0,
            },
            Chunk {
                text: "c d e f".into(),
                token_count: 4,
                start_sentence: 1,
                end_sentence: 3,
                overlap_sentences: 0,
            },
        ];
        let stats = ChunkStats::from_chunks(&chunks, 3);
        assert_eq!(stats.chunk_count, 2);
        assert_eq!(stats.min_tokens, 2);
        assert_eq!(stats.max_tokens, 4);
        assert!((stats.mean_tokens - 3.0).abs() < f32::EPSILON);
    }
}
