// SPDX-License-Identifier: MIT OR Apache-2.0

//! `qadistill dedup`

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

use qadistill::config::Config;
use qadistill::embedding::embed_in_batches;
use qadistill::grouping::{deduplicate_buckets, DedupOutcome, DedupStats, Item};
use qadistill::output::{
    colorize_count, colorize_detail, colorize_heading, colorize_label, use_colors,
};
use qadistill::records::{read_input_records, write_jsonl, InputRecord};

use super::{open_output, progress_bar};
use crate::cli::OutputFormat;

#[derive(Serialize)]
struct BucketAudit<'a> {
    clusters: &'a BTreeMap<usize, Vec<usize>>,
    skipped: &'a [usize],
}

#[derive(Serialize)]
struct DedupSummary<'a> {
    total: DedupStats,
    buckets: BTreeMap<&'a str, &'a DedupStats>,
}

/// Arguments of one dedup run.
pub struct DedupArgs<'a> {
    pub input: &'a Path,
    pub text_field: &'a str,
    pub bucket_field: Option<&'a str>,
    pub output: Option<&'a Path>,
    pub audit: Option<&'a Path>,
}

/// Embeds, deduplicates per bucket, and writes retained records.
pub fn run(args: &DedupArgs<'_>, config: &Config, format: OutputFormat) -> Result<()> {
    let grouping = config.grouping.to_config()?;

    let file = File::open(args.input)
        .with_context(|| format!("Failed to open items file: {}", args.input.display()))?;
    let records = read_input_records(BufReader::new(file), args.text_field, args.bucket_field)
        .with_context(|| format!("Failed to read items from {}", args.input.display()))?;

    let mut provider = config.embeddings.build_provider()?;
    let texts: Vec<String> = records.iter().filter_map(|r| r.text.clone()).collect();
    info!(
        items = records.len(),
        texts = texts.len(),
        model = provider.model_id(),
        "embedding items"
    );

    let pb = progress_bar(texts.len(), "texts")?;
    let vectors = embed_in_batches(provider.as_mut(), &texts, |done| {
        pb.set_position(done as u64)
    })?;
    pb.finish_and_clear();

    let items = attach_embeddings(records, vectors);
    let outcomes = deduplicate_buckets(items, &grouping)?;

    write_jsonl(
        open_output(args.output)?,
        outcomes.values().flat_map(|outcome| outcome.records.iter()),
    )?;

    if let Some(path) = args.audit {
        write_audit(path, &outcomes)?;
    }

    print_summary(&outcomes, format)
}

/// Pairs records with vectors, consumed in order by records that have text.
fn attach_embeddings(records: Vec<InputRecord>, vectors: Vec<Vec<f32>>) -> Vec<Item> {
    let mut vectors = vectors.into_iter();
    records
        .into_iter()
        .map(|record| {
            let embedding = match record.text {
                Some(_) => vectors.next(),
                None => None,
            };
            Item::new(record.index, record.fields, embedding).with_bucket(record.bucket)
        })
        .collect()
}

fn write_audit(path: &Path, outcomes: &BTreeMap<String, DedupOutcome>) -> Result<()> {
    let audit: BTreeMap<&str, BucketAudit<'_>> = outcomes
        .iter()
        .map(|(bucket, outcome)| {
            (
                bucket.as_str(),
                BucketAudit {
                    clusters: &outcome.audit,
                    skipped: &outcome.skipped,
                },
            )
        })
        .collect();

    let writer = open_output(Some(path))?;
    serde_json::to_writer_pretty(writer, &audit)
        .with_context(|| format!("Failed to write audit file: {}", path.display()))?;
    Ok(())
}

fn print_summary(outcomes: &BTreeMap<String, DedupOutcome>, format: OutputFormat) -> Result<()> {
    let mut total = DedupStats::default();
    for outcome in outcomes.values() {
        total.absorb(&outcome.stats);
    }

    match format {
        OutputFormat::Json => {
            let summary = DedupSummary {
                total,
                buckets: outcomes
                    .iter()
                    .map(|(bucket, outcome)| (bucket.as_str(), &outcome.stats))
                    .collect(),
            };
            eprintln!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            let color = use_colors();
            eprintln!(
                "{} {} items into {} representatives ({} clusters, {} skipped)",
                colorize_heading("Deduplicated", color),
                colorize_count(total.input_items, color),
                colorize_count(total.retained, color),
                total.clusters,
                total.skipped
            );
            for (bucket, outcome) in outcomes {
                let stats = &outcome.stats;
                let detail = format!(
                    "{} items, {} clusters, largest {}, {} singletons, {} sampled out",
                    stats.input_items,
                    stats.clusters,
                    stats.largest_cluster,
                    stats.singletons,
                    stats.sampled_out
                );
                eprintln!(
                    "  {}: {}",
                    colorize_label(bucket, color),
                    colorize_detail(&detail, color)
                );
            }
        }
    }
    Ok(())
}
