// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text collaborators of the chunking engine: sentence segmentation and
//! token counting.

pub mod segmenter;
pub mod tokenizer;

pub use segmenter::{SentenceSegmenter, UnicodeSentenceSegmenter};
pub use tokenizer::{TiktokenCounter, TokenCounter, TokenizerKind, WordCounter};
