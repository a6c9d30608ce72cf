// SPDX-License-Identifier: MIT OR Apache-2.0

//! `qadistill chunk`

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use qadistill::chunking::{ChunkedDocument, PreparedDocument, SemanticChunker};
use qadistill::config::{ChunkingSection, Config};
use qadistill::documents::{collect_paths, load_document};
use qadistill::output::{
    colorize_count, colorize_error, colorize_heading, colorize_label, use_colors,
};
use qadistill::records::{write_jsonl, ChunkRecord};
use qadistill::text::UnicodeSentenceSegmenter;

use super::{open_output, progress_bar};
use crate::cli::{ChunkOverrides, OutputFormat};

#[derive(Debug, Serialize)]
struct DocumentFailure {
    path: String,
    error: String,
}

#[derive(Debug, Default, Serialize)]
struct ChunkSummary {
    tokenizer: String,
    documents: usize,
    failed: usize,
    sentences: usize,
    chunks: usize,
    min_tokens: usize,
    max_tokens: usize,
    mean_tokens: f32,
    failures: Vec<DocumentFailure>,
}

impl ChunkSummary {
    fn new(
        tokenizer: &str,
        documents: &[ChunkedDocument],
        failures: Vec<DocumentFailure>,
    ) -> Self {
        let tokens: Vec<usize> = documents
            .iter()
            .flat_map(|d| d.chunks.iter().map(|c| c.token_count))
            .collect();
        let mean_tokens = if tokens.is_empty() {
            0.0
        } else {
            tokens.iter().sum::<usize>() as f32 / tokens.len() as f32
        };
        Self {
            tokenizer: tokenizer.to_string(),
            documents: documents.len(),
            failed: failures.len(),
            sentences: documents.iter().map(|d| d.stats.sentence_count).sum(),
            chunks: tokens.len(),
            min_tokens: tokens.iter().copied().min().unwrap_or(0),
            max_tokens: tokens.iter().copied().max().unwrap_or(0),
            mean_tokens,
            failures,
        }
    }
}

fn apply_overrides(section: &ChunkingSection, overrides: &ChunkOverrides) -> ChunkingSection {
    let mut section = section.clone();
    if overrides.similarity_threshold.is_some() {
        section.similarity_threshold = overrides.similarity_threshold;
    }
    if overrides.min_tokens.is_some() {
        section.min_tokens = overrides.min_tokens;
    }
    if overrides.max_tokens.is_some() {
        section.max_tokens = overrides.max_tokens;
    }
    if overrides.target_chunk_size.is_some() {
        section.target_chunk_size = overrides.target_chunk_size;
    }
    if overrides.overlap_size.is_some() {
        section.overlap_size = overrides.overlap_size;
    }
    section
}

/// Chunks every document under `paths` and writes one record per document.
pub fn run(
    paths: &[PathBuf],
    output: Option<&Path>,
    overrides: &ChunkOverrides,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let section = apply_overrides(&config.chunking, overrides);
    let chunking = section.to_config()?;
    let tokenizer = section.tokenizer().build()?;
    let chunker = SemanticChunker::new(chunking, Box::new(UnicodeSentenceSegmenter), tokenizer)?;
    let mut provider = config.embeddings.build_provider()?;

    let files = collect_paths(paths);
    info!(
        documents = files.len(),
        model = provider.model_id(),
        tokenizer = chunker.tokenizer().name(),
        max_tokens = chunker.config().max_tokens,
        "chunking documents"
    );

    let mut prepared: Vec<(PathBuf, PreparedDocument)> = Vec::with_capacity(files.len());
    let mut failures = Vec::new();

    let pb = progress_bar(files.len(), "documents")?;
    for path in &files {
        pb.set_message(path.display().to_string());
        let result = load_document(path)
            .and_then(|doc| chunker.prepare(&doc.title, &doc.text, provider.as_mut()));
        match result {
            Ok(document) => prepared.push((path.clone(), document)),
            Err(err) => {
                warn!(path = %path.display(), error = %format!("{:#}", err), "skipping document");
                failures.push(DocumentFailure {
                    path: path.display().to_string(),
                    error: format!("{:#}", err),
                });
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let (paths_done, documents_in): (Vec<PathBuf>, Vec<PreparedDocument>) =
        prepared.into_iter().unzip();
    let mut documents = Vec::with_capacity(documents_in.len());
    for (path, result) in paths_done
        .iter()
        .zip(chunker.chunk_prepared_batch(&documents_in))
    {
        match result {
            Ok(document) => documents.push(document),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to chunk document");
                failures.push(DocumentFailure {
                    path: path.display().to_string(),
                    error: err.to_string(),
                });
            }
        }
    }

    if documents.is_empty() && !failures.is_empty() {
        let summary = ChunkSummary::new(chunker.tokenizer().name(), &documents, failures);
        print_summary(&summary, format)?;
        bail!("No documents could be chunked");
    }

    let records: Vec<ChunkRecord> = documents.iter().map(ChunkRecord::from).collect();
    write_jsonl(open_output(output)?, &records)?;

    let summary = ChunkSummary::new(chunker.tokenizer().name(), &documents, failures);
    print_summary(&summary, format)
}

fn print_summary(summary: &ChunkSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            eprintln!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => {
            let color = use_colors();
            eprintln!(
                "{} {} documents into {} chunks ({} sentences, tokenizer {})",
                colorize_heading("Chunked", color),
                colorize_count(summary.documents, color),
                colorize_count(summary.chunks, color),
                summary.sentences,
                summary.tokenizer
            );
            if summary.chunks > 0 {
                eprintln!(
                    "  tokens per chunk: min {} / mean {:.1} / max {}",
                    summary.min_tokens, summary.mean_tokens, summary.max_tokens
                );
            }
            for failure in &summary.failures {
                eprintln!(
                    "  {} {}: {}",
                    colorize_error("failed", color),
                    colorize_label(&failure.path, color),
                    failure.error
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_over_config() {
        let section = ChunkingSection {
            min_tokens: Some(10),
            max_tokens: Some(100),
            ..ChunkingSection::default()
        };
        let overrides = ChunkOverrides {
            max_tokens: Some(50),
            ..ChunkOverrides::default()
        };
        let merged = apply_overrides(&section, &overrides);
        assert_eq!(merged.min_tokens, Some(10));
        assert_eq!(merged.max_tokens, Some(50));
        assert_eq!(merged.overlap_size, None);
    }
}
