// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted record shapes and JSON Lines I/O.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{BufRead, Write};

use crate::chunking::ChunkedDocument;

pub use crate::grouping::DedupRecord;

/// Bucket name used when no bucket field is configured or present.
pub const DEFAULT_BUCKET: &str = "default";

/// One output line of the chunk command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub title: String,
    pub chunks: Vec<String>,
}

impl From<&ChunkedDocument> for ChunkRecord {
    fn from(document: &ChunkedDocument) -> Self {
        Self {
            title: document.title.clone(),
            chunks: document.chunks.iter().map(|c| c.text.clone()).collect(),
        }
    }
}

/// A dataset line read for deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct InputRecord {
    /// Position among the non-blank input lines.
    pub index: usize,
    pub bucket: String,
    /// Text to embed; `None` when the field is missing, not a string, or blank.
    pub text: Option<String>,
    pub fields: Map<String, Value>,
}

/// Reads JSON objects, one per line. Blank lines are ignored.
pub fn read_input_records<R: BufRead>(
    reader: R,
    text_field: &str,
    bucket_field: Option<&str>,
) -> Result<Vec<InputRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on line {}", line_no + 1))?;
        let Value::Object(fields) = value else {
            bail!("Line {} is not a JSON object", line_no + 1);
        };

        let text = fields
            .get(text_field)
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string);
        let bucket = bucket_field
            .and_then(|name| fields.get(name))
            .map(bucket_name)
            .unwrap_or_else(|| DEFAULT_BUCKET.to_string());

        records.push(InputRecord {
            index: records.len(),
            bucket,
            text,
            fields,
        });
    }
    Ok(records)
}

fn bucket_name(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => DEFAULT_BUCKET.to_string(),
        other => other.to_string(),
    }
}

/// Writes each record as one JSON line.
pub fn write_jsonl<'a, T, W, I>(mut writer: W, records: I) -> Result<()>
where
    T: Serialize + 'a,
    W: Write,
    I: IntoIterator<Item = &'a T>,
{
    for record in records {
        serde_json::to_writer(&mut writer, record).context("Failed to serialize record")?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}
