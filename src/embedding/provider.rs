// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and implementations.
//!
//! Providers map a batch of texts to one vector per text, in input order.
//! An empty vector marks a text the provider could not embed.

use anyhow::{bail, Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use serde_json::Value;
use std::borrow::Cow;
use std::env;
use std::io::Write;
use std::process::{Command, Stdio};

const DEFAULT_FASTEMBED_MODEL: &str = "minilm";
const DEFAULT_FASTEMBED_BATCH_SIZE: usize = 64;
const MAX_FASTEMBED_BATCH_SIZE: usize = 1024;
const DEFAULT_FASTEMBED_MAX_CHARS: usize = 2000;
const DEFAULT_COMMAND_BATCH_SIZE: usize = 64;

/// Default dimension of [`HashingEmbedder`] vectors.
pub const DEFAULT_HASHING_DIM: usize = 256;

pub const ENV_EMBED_MODEL: &str = "QADISTILL_EMBED_MODEL";
pub const ENV_EMBED_BATCH_SIZE: &str = "QADISTILL_EMBED_BATCH_SIZE";
pub const ENV_EMBED_MAX_CHARS: &str = "QADISTILL_EMBED_MAX_CHARS";
pub const ENV_EMBED_NORMALIZE: &str = "QADISTILL_EMBED_NORMALIZE";

/// Configuration for the built-in fastembed provider.
#[derive(Debug, Clone)]
pub struct EmbeddingProviderConfig {
    pub model: EmbeddingModel,
    pub batch_size: usize,
    pub max_chars: usize,
    pub normalize: bool,
}

impl EmbeddingProviderConfig {
    /// Builds the config from defaults, a config-file model/batch size, and
    /// `QADISTILL_EMBED_*` environment overrides (highest precedence).
    pub fn resolve(model: Option<&str>, batch_size: Option<usize>) -> Result<Self> {
        let model_name = match env::var(ENV_EMBED_MODEL) {
            Ok(raw) if !raw.trim().is_empty() => raw,
            _ => model.unwrap_or(DEFAULT_FASTEMBED_MODEL).to_string(),
        };
        let model = parse_model(&model_name)?;

        let mut batch_size = parse_usize_env(
            ENV_EMBED_BATCH_SIZE,
            batch_size.unwrap_or(DEFAULT_FASTEMBED_BATCH_SIZE),
        )?;
        if batch_size == 0 {
            batch_size = DEFAULT_FASTEMBED_BATCH_SIZE;
        }
        if batch_size > MAX_FASTEMBED_BATCH_SIZE {
            tracing::warn!(
                batch_size,
                max = MAX_FASTEMBED_BATCH_SIZE,
                "embedding batch size too large; clamping"
            );
            batch_size = MAX_FASTEMBED_BATCH_SIZE;
        }

        let mut max_chars = parse_usize_env(ENV_EMBED_MAX_CHARS, DEFAULT_FASTEMBED_MAX_CHARS)?;
        if max_chars == 0 {
            max_chars = DEFAULT_FASTEMBED_MAX_CHARS;
        }

        let normalize = parse_bool_env(ENV_EMBED_NORMALIZE, true)?;

        Ok(Self {
            model,
            batch_size,
            max_chars,
            normalize,
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::resolve(None, None)
    }
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModel::AllMiniLML6V2,
            batch_size: DEFAULT_FASTEMBED_BATCH_SIZE,
            max_chars: DEFAULT_FASTEMBED_MAX_CHARS,
            normalize: true,
        }
    }
}

/// Trait for embedding providers.
pub trait EmbeddingProvider: Send {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the batch size used by the provider.
    fn batch_size(&self) -> usize;

    /// Generates one embedding per text, in order. Empty vectors are
    /// placeholders for texts that could not be embedded.
    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    fn embed_one(&mut self, text: &str) -> Result<Vec<f32>> {
        let mut result = self.embed_texts(&[text.to_string()])?;
        result
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No embedding returned"))
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn batch_size(&self) -> usize {
        (**self).batch_size()
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_texts(texts)
    }
}

/// Local sentence-transformer provider backed by fastembed.
pub struct FastEmbedder {
    embedder: TextEmbedding,
    config: EmbeddingProviderConfig,
    model_id: String,
}

impl FastEmbedder {
    pub fn new(config: EmbeddingProviderConfig) -> Result<Self> {
        let model = config.model.clone();
        let model_id = model.to_string();
        let init = InitOptions::new(model);
        let embedder =
            TextEmbedding::try_new(init).context("Failed to initialize fastembed model")?;

        Ok(Self {
            embedder,
            config,
            model_id,
        })
    }
}

impl EmbeddingProvider for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prepared = truncate_texts(texts, self.config.max_chars);
        let mut embeddings = self
            .embedder
            .embed(&prepared, Some(self.config.batch_size))?;

        if self.config.normalize {
            for embedding in embeddings.iter_mut() {
                l2_normalize(embedding);
            }
        }

        Ok(embeddings)
    }
}

/// Provider that shells out to an external process.
///
/// The command receives `{"model": ..., "texts": [...]}` on stdin and must
/// print either a JSON array of rows or an object with an `embeddings`,
/// `vectors` or `data` array. A `null` row marks a text it could not embed.
pub struct CommandProvider {
    command: String,
    model: String,
    batch_size: usize,
}

impl CommandProvider {
    pub fn new(command: String, model: String) -> Self {
        Self {
            command,
            model,
            batch_size: DEFAULT_COMMAND_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size;
        }
        self
    }

    fn run_command(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let payload = serde_json::json!({
            "model": self.model,
            "texts": texts,
        });

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn embedding command: {}", self.command))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.to_string().as_bytes())
                .context("Failed to write embeddings payload to stdin")?;
        }

        let output = child
            .wait_with_output()
            .context("Failed to read embeddings command output")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Embedding command failed (status {}): {}",
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let vectors = parse_command_output(stdout.trim())?;
        if vectors.len() != texts.len() {
            bail!(
                "Embedding command returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            );
        }
        Ok(vectors)
    }
}

fn parse_command_output(raw: &str) -> Result<Vec<Vec<f32>>> {
    let parsed: Value = serde_json::from_str(raw)
        .with_context(|| "Failed to parse embeddings command output as JSON")?;

    let rows = match parsed {
        Value::Array(arr) => arr,
        Value::Object(mut obj) => match ["embeddings", "vectors", "data"]
            .iter()
            .find_map(|key| obj.remove(*key))
        {
            Some(Value::Array(arr)) => arr,
            Some(_) => bail!("Embeddings output must be a JSON array"),
            None => bail!("Embeddings command output missing 'embeddings' field"),
        },
        _ => bail!("Embeddings command output must be JSON array or object"),
    };

    rows.iter()
        .map(|row| match row {
            Value::Null => Ok(Vec::new()),
            Value::Array(values) => values
                .iter()
                .map(|value| {
                    value
                        .as_f64()
                        .ok_or_else(|| anyhow::anyhow!("Embedding value must be a number"))
                        .map(|v| v as f32)
                })
                .collect::<Result<Vec<f32>>>(),
            _ => bail!("Embedding row must be an array or null"),
        })
        .collect()
}

impl EmbeddingProvider for CommandProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run_command(texts)
    }
}

/// Offline provider using signed feature hashing over lowercase words.
///
/// Texts sharing vocabulary get similar vectors, which is enough for tests
/// and air-gapped runs. Vectors are L2-normalized; a text with no words
/// maps to the zero vector.
pub struct HashingEmbedder {
    model: String,
    dimension: usize,
    batch_size: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            model: format!("hashing-{}", dimension),
            dimension,
            batch_size: DEFAULT_COMMAND_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size;
        }
        self
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = blake3::hash(word.to_lowercase().as_bytes());
            let bytes = hash.as_bytes();
            let mut slot = [0u8; 8];
            slot.copy_from_slice(&bytes[..8]);
            let bucket = (u64::from_le_bytes(slot) % self.dimension as u64) as usize;
            let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed(text)).collect())
    }
}

fn truncate_texts<'a>(texts: &'a [String], max_chars: usize) -> Vec<Cow<'a, str>> {
    texts
        .iter()
        .map(|text| truncate_to_chars(text.as_str(), max_chars))
        .collect()
}

fn truncate_to_chars<'a>(input: &'a str, max_chars: usize) -> Cow<'a, str> {
    if max_chars == 0 {
        return Cow::Borrowed("");
    }

    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(input[..idx].to_string()),
        None => Cow::Borrowed(input),
    }
}

pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

fn parse_model(raw: &str) -> Result<EmbeddingModel> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(EmbeddingModel::AllMiniLML6V2);
    }

    match value.to_lowercase().as_str() {
        "minilm"
        | "all-minilm-l6-v2"
        | "sentence-transformers/all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        "bge-small" | "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => {
            Ok(EmbeddingModel::BGESmallENV15)
        }
        "bge-base" | "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => {
            Ok(EmbeddingModel::BGEBaseENV15)
        }
        other => bail!(
            "Unsupported embedding model '{}'. Supported values: minilm, bge-small, bge-base",
            other
        ),
    }
}

fn parse_usize_env(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim();
            if value.is_empty() {
                Ok(default)
            } else {
                value
                    .parse::<usize>()
                    .with_context(|| format!("Invalid {} value: {}", name, value))
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", name)),
    }
}

fn parse_bool_env(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim().to_lowercase();
            if value.is_empty() {
                return Ok(default);
            }
            match value.as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => bail!("Invalid {} value: {}", name, other),
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("Failed to read {}", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    #[test]
    fn test_hashing_embedder_shapes() {
        let mut provider = HashingEmbedder::new(64);
        assert_eq!(provider.model_id(), "hashing-64");

        let result = provider
            .embed_texts(&["hello world".to_string(), "".to_string()])
            .unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].len(), 64);
        let norm: f32 = result[0].iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(result[1].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_hashing_embedder_similarity_tracks_vocabulary() {
        let mut provider = HashingEmbedder::default();
        let a = provider.embed_one("The cat sat on the mat").unwrap();
        let b = provider.embed_one("the CAT sat on the mat!").unwrap();
        let c = provider.embed_one("Quarterly revenue grew sharply").unwrap();

        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
        assert!(cosine_similarity(&a, &c) < 0.5);
    }

    #[test]
    fn test_empty_embed() {
        let mut provider = HashingEmbedder::default();
        assert!(provider.embed_texts(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_truncate_to_chars() {
        let input = "hello";
        assert_eq!(
            truncate_to_chars(input, 2),
            Cow::<str>::Owned("he".to_string())
        );
        assert_eq!(truncate_to_chars(input, 5), Cow::Borrowed(input));
        assert_eq!(truncate_to_chars("héllo", 2), Cow::<str>::Owned("hé".to_string()));
    }

    #[test]
    fn test_command_output_formats() {
        let rows = parse_command_output("[[1.0, 0.0], null]").unwrap();
        assert_eq!(rows, vec![vec![1.0, 0.0], vec![]]);

        let rows = parse_command_output(r#"{"embeddings": [[0.5]]}"#).unwrap();
        assert_eq!(rows, vec![vec![0.5]]);

        assert!(parse_command_output(r#"{"other": []}"#).is_err());
        assert!(parse_command_output(r#"[["x"]]"#).is_err());
    }

    #[test]
    fn test_command_provider_count_mismatch() {
        let mut provider =
            CommandProvider::new("echo '[[1.0]]'".to_string(), "fixed".to_string());
        let err = provider
            .embed_texts(&["a".to_string(), "b".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("1 vectors for 2 texts"));
    }

    #[test]
    fn test_parse_model_aliases() {
        assert!(matches!(
            parse_model("MiniLM").unwrap(),
            EmbeddingModel::AllMiniLML6V2
        ));
        assert!(matches!(
            parse_model("bge-small").unwrap(),
            EmbeddingModel::BGESmallENV15
        ));
        assert!(parse_model("word2vec").is_err());
    }
}
