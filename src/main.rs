// SPDX-License-Identifier: MIT OR Apache-2.0

//! qadistill - Semantic chunking and near-duplicate reduction
//!
//! Turns raw documents into token-bounded chunks for question generation,
//! and collapses near-duplicate dataset items into weighted representatives.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use qadistill::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize tracing with QADISTILL_LOG (e.g., QADISTILL_LOG=debug qadistill chunk docs/)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("QADISTILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = cli.format;
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Chunk {
            paths,
            output,
            overrides,
        } => commands::chunk::run(&paths, output.as_deref(), &overrides, &config, format)?,
        Commands::Dedup {
            input,
            text_field,
            bucket_field,
            output,
            audit,
        } => {
            let args = commands::dedup::DedupArgs {
                input: &input,
                text_field: &text_field,
                bucket_field: bucket_field.as_deref(),
                output: output.as_deref(),
                audit: audit.as_deref(),
            };
            commands::dedup::run(&args, &config, format)?;
        }
    }

    Ok(())
}
