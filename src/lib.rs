// SPDX-License-Identifier: MIT OR Apache-2.0

//! qadistill - Semantic chunking and near-duplicate reduction for QA datasets
//!
//! Shared modules for the qadistill CLI tool.

pub mod chunking;
pub mod config;
pub mod documents;
pub mod embedding;
pub mod errors;
pub mod grouping;
pub mod output;
pub mod records;
pub mod similarity;
pub mod text;
