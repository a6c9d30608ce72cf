// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chunk assembly over similarity segments.
//!
//! The assembler walks segments in order and threads a single
//! [`Accumulator`] through [`Assembler::step`]. Each step is a pure function
//! of the current accumulator and the next segment, returning the new
//! accumulator plus any chunks emitted by that transition:
//!
//! ```text
//! fits:           acc + seg <= max      -> append; emit if >= target
//! overflow, full: acc >= min            -> emit acc; restart from seg
//! overflow, thin: acc <  min            -> force-merge; emit if >= min or > max
//! end:            leftover < min        -> glue onto previous chunk
//! ```
//!
//! Token counts are always taken on the joined text of the whole span.

use std::ops::Range;

use tracing::trace;

use super::boundary::{is_valid, segments};
use super::config::ChunkingConfig;
use crate::errors::CoreError;
use crate::text::TokenCounter;

/// Separator used when joining sentences into chunk text.
pub const SENTENCE_SEPARATOR: &str = " ";

/// A finished chunk of document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Sentences joined with a single space.
    pub text: String,
    /// Token count of `text`.
    pub token_count: usize,
    /// First sentence index (inclusive), overlap included.
    pub start_sentence: usize,
    /// Last sentence index (exclusive).
    pub end_sentence: usize,
    /// Leading sentences carried over from the previous chunk.
    pub overlap_sentences: usize,
}

impl Chunk {
    /// Sentence range contributed by this chunk alone (overlap excluded).
    pub fn fresh_sentences(&self) -> Range<usize> {
        self.start_sentence + self.overlap_sentences..self.end_sentence
    }
}

/// In-progress chunk: the contiguous sentence span `start..end`.
///
/// `start..fresh_start` is overlap carried from the previous chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulator {
    pub start: usize,
    pub fresh_start: usize,
    pub end: usize,
    pub token_count: usize,
}

impl Accumulator {
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True when the span holds sentences not yet emitted in any chunk.
    pub fn has_fresh(&self) -> bool {
        self.fresh_start < self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Result of one state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub acc: Accumulator,
    pub emitted: Vec<Chunk>,
}

/// Per-document assembly context.
pub struct Assembler<'a> {
    sentences: &'a [String],
    config: &'a ChunkingConfig,
    tokenizer: &'a dyn TokenCounter,
}

impl<'a> Assembler<'a> {
    pub fn new(
        sentences: &'a [String],
        config: &'a ChunkingConfig,
        tokenizer: &'a dyn TokenCounter,
    ) -> Self {
        Self {
            sentences,
            config,
            tokenizer,
        }
    }

    fn text(&self, range: Range<usize>) -> String {
        self.sentences[range].join(SENTENCE_SEPARATOR)
    }

    fn count(&self, range: Range<usize>) -> usize {
        if range.is_empty() {
            return 0;
        }
        self.tokenizer.count_tokens(&self.text(range))
    }

    /// Appends `segment` (which must start at `acc.end` unless `acc` is empty).
    fn extend(&self, acc: &Accumulator, segment: &Range<usize>) -> Accumulator {
        let (start, fresh_start) = if acc.is_empty() {
            (segment.start, segment.start)
        } else {
            (acc.start, acc.fresh_start)
        };
        Accumulator {
            start,
            fresh_start,
            end: segment.end,
            token_count: self.count(start..segment.end),
        }
    }

    /// Emits `acc` and returns the overlap seed for the next chunk.
    ///
    /// An accumulator holding only overlap emits nothing.
    fn flush(&self, acc: &Accumulator) -> (Option<Chunk>, Accumulator) {
        if !acc.has_fresh() {
            return (None, *acc);
        }

        let chunk = Chunk {
            text: self.text(acc.range()),
            token_count: acc.token_count,
            start_sentence: acc.start,
            end_sentence: acc.end,
            overlap_sentences: acc.fresh_start - acc.start,
        };

        let seed_start = acc.end - self.config.overlap_size.min(acc.len());
        let seed = Accumulator {
            start: seed_start,
            fresh_start: acc.end,
            end: acc.end,
            token_count: self.count(seed_start..acc.end),
        };

        trace!(
            start = chunk.start_sentence,
            end = chunk.end_sentence,
            tokens = chunk.token_count,
            "flushed chunk"
        );
        (Some(chunk), seed)
    }

    fn flush_into(&self, acc: &Accumulator, emitted: &mut Vec<Chunk>) -> Accumulator {
        let (chunk, seed) = self.flush(acc);
        emitted.extend(chunk);
        seed
    }

    /// Feeds one segment through the state machine.
    pub fn step(&self, acc: Accumulator, segment: Range<usize>) -> Step {
        let config = self.config;
        let mut emitted = Vec::new();
        let segment_tokens = self.count(segment.clone());

        if acc.token_count + segment_tokens <= config.max_tokens {
            let grown = self.extend(&acc, &segment);
            let acc = if grown.token_count >= config.target_chunk_size {
                self.flush_into(&grown, &mut emitted)
            } else {
                grown
            };
            return Step { acc, emitted };
        }

        if acc.token_count >= config.min_tokens {
            // Overlap that cannot share a chunk with this segment is dropped;
            // its sentences were already emitted.
            let mut base = if acc.has_fresh() {
                self.flush_into(&acc, &mut emitted)
            } else {
                Accumulator::default()
            };
            if !base.is_empty() && base.token_count + segment_tokens > config.max_tokens {
                base = Accumulator::default();
            }

            // Left open even past target or max; a later overflow or `finish` emits it.
            let acc = self.extend(&base, &segment);
            return Step { acc, emitted };
        }

        let merged = self.extend(&acc, &segment);
        let acc = if merged.token_count >= config.min_tokens
            || merged.token_count > config.max_tokens
        {
            self.flush_into(&merged, &mut emitted)
        } else {
            merged
        };
        Step { acc, emitted }
    }

    /// Handles the leftover accumulator at end of document.
    pub fn finish(&self, acc: Accumulator, chunks: &mut Vec<Chunk>) {
        if !acc.has_fresh() {
            return;
        }

        if acc.token_count < self.config.min_tokens {
            if let Some(previous) = chunks.last_mut() {
                let fresh = acc.fresh_start..acc.end;
                previous.text.push_str(SENTENCE_SEPARATOR);
                previous.text.push_str(&self.text(fresh));
                previous.end_sentence = acc.end;
                previous.token_count = self.tokenizer.count_tokens(&previous.text);
                return;
            }
        }

        let (chunk, _) = self.flush(&acc);
        chunks.extend(chunk);
    }
}

/// Assembles chunks for one document from its sentences and segment boundaries.
pub fn assemble_chunks(
    sentences: &[String],
    boundaries: &[usize],
    config: &ChunkingConfig,
    tokenizer: &dyn TokenCounter,
) -> Result<Vec<Chunk>, CoreError> {
    config.validate()?;
    if !is_valid(boundaries, sentences.len()) {
        return Err(CoreError::InvalidBoundaries {
            boundaries: boundaries.to_vec(),
            sentences: sentences.len(),
        });
    }
    if sentences.is_empty() {
        return Ok(Vec::new());
    }

    let assembler = Assembler::new(sentences, config, tokenizer);
    let mut acc = Accumulator::default();
    let mut chunks = Vec::new();

    for segment in segments(boundaries) {
        let step = assembler.step(acc, segment);
        chunks.extend(step.emitted);
        acc = step.acc;
    }
    assembler.finish(acc, &mut chunks);

    Ok(chunks)
}
