// SPDX-License-Identifier: MIT OR Apache-2.0

//! CLI argument parsing using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// qadistill - Semantic chunking and near-duplicate reduction
///
/// Splits raw documents into token-bounded, topically coherent chunks and
/// collapses near-duplicate dataset items into weighted representatives.
#[derive(Parser, Debug)]
#[command(name = "qadistill")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Summary format (text or json)
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Configuration file (overrides .qadistillrc.toml and ~/.config/qadistill/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for run summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Command-line overrides for the `[chunking]` section
#[derive(Args, Debug, Clone, Default)]
pub struct ChunkOverrides {
    /// Adjacent similarity below which a new segment starts (-1.0 to 1.0)
    #[arg(long)]
    pub similarity_threshold: Option<f32>,

    /// Minimum tokens per chunk
    #[arg(long)]
    pub min_tokens: Option<usize>,

    /// Maximum tokens per chunk
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Emit a chunk once it reaches this many tokens
    #[arg(long)]
    pub target_chunk_size: Option<usize>,

    /// Sentences repeated at the start of the next chunk
    #[arg(long)]
    pub overlap_size: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split documents into semantic chunks (JSON Lines output)
    Chunk {
        /// Files or directories (.txt, .md) to chunk
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write chunk records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: ChunkOverrides,
    },

    /// Collapse near-duplicate items into weighted representatives
    Dedup {
        /// JSON Lines file of items
        input: PathBuf,

        /// Field holding the text to embed
        #[arg(long)]
        text_field: String,

        /// Field whose value splits items into independent buckets
        #[arg(long)]
        bucket_field: Option<String>,

        /// Write retained records here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the cluster membership audit (JSON) here
        #[arg(long)]
        audit: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_chunk_overrides() {
        let cli = Cli::parse_from([
            "qadistill",
            "--format",
            "json",
            "chunk",
            "docs",
            "--min-tokens",
            "8",
            "--overlap-size",
            "1",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Chunk {
                paths, overrides, ..
            } => {
                assert_eq!(paths, vec![PathBuf::from("docs")]);
                assert_eq!(overrides.min_tokens, Some(8));
                assert_eq!(overrides.overlap_size, Some(1));
                assert_eq!(overrides.max_tokens, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
