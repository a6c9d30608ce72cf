// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sentence segmentation.

use unicode_segmentation::UnicodeSegmentation;

/// Splits a document into an ordered list of sentences.
pub trait SentenceSegmenter: Send + Sync {
    /// Returns cleaned, non-empty sentences in document order.
    fn segment(&self, text: &str) -> Vec<String>;
}

/// UAX #29 sentence boundaries with whitespace normalisation.
///
/// Runs of whitespace (including line breaks) inside a sentence collapse to a
/// single space, and sentences left empty are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeSentenceSegmenter;

impl SentenceSegmenter for UnicodeSentenceSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        text.unicode_sentences()
            .map(normalize_whitespace)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn normalize_whitespace(sentence: &str) -> String {
    sentence.split_whitespace().collect::<Vec<_>>().join(" ")
}
