// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed embedding cache.
//!
//! Vectors are keyed by `(model_id, blake3(text))`, so a cached vector is
//! bit-identical to the one the provider produced for the same text.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::EmbeddingProvider;

/// Persistent `(model, text hash) -> vector` store.
pub struct EmbeddingCache {
    conn: Connection,
    path: Option<PathBuf>,
}

impl EmbeddingCache {
    /// Opens or creates a cache database at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open cache database: {}", path.display()))?;
        let cache = Self {
            conn,
            path: Some(path),
        };
        cache.init_schema()?;
        Ok(cache)
    }

    /// Opens a throwaway in-memory cache.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory cache")?;
        let cache = Self { conn, path: None };
        cache.init_schema()?;
        Ok(cache)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                r#"
            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS embeddings (
                model_id TEXT NOT NULL,
                text_hash TEXT NOT NULL,
                dimension INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                PRIMARY KEY (model_id, text_hash)
            );
            "#,
            )
            .context("Failed to initialize cache schema")?;
        self.conn.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES ('schema_version', '1')",
            [],
        )?;
        Ok(())
    }

    /// Returns the path to the database file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Content hash used as the cache key.
    pub fn text_hash(text: &str) -> String {
        blake3::hash(text.as_bytes()).to_hex().to_string()
    }

    /// Looks up one vector.
    pub fn get(&self, model_id: &str, text_hash: &str) -> Result<Option<Vec<f32>>> {
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT embedding FROM embeddings WHERE model_id = ?1 AND text_hash = ?2",
                params![model_id, text_hash],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read cached embedding")?;
        Ok(blob.map(|b| blob_to_embedding(&b)))
    }

    /// Stores vectors in a single transaction. Empty vectors are not cached.
    pub fn put_many(&mut self, model_id: &str, entries: &[(String, Vec<f32>)]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut stored = 0;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO embeddings (model_id, text_hash, dimension, embedding)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(model_id, text_hash) DO UPDATE SET
                    dimension = excluded.dimension,
                    embedding = excluded.embedding
                "#,
            )?;
            for (hash, embedding) in entries.iter().filter(|(_, e)| !e.is_empty()) {
                stmt.execute(params![
                    model_id,
                    hash,
                    embedding.len() as i64,
                    embedding_to_blob(embedding)
                ])?;
                stored += 1;
            }
        }
        tx.commit().context("Failed to commit cached embeddings")?;
        Ok(stored)
    }

    /// Number of cached vectors for `model_id`.
    pub fn count(&self, model_id: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM embeddings WHERE model_id = ?1",
            params![model_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Removes every cached vector.
    pub fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM embeddings", [])
            .context("Failed to clear embedding cache")?;
        Ok(())
    }
}

fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Wraps a provider so only cache misses reach it.
pub struct CachedProvider<P> {
    inner: P,
    cache: EmbeddingCache,
    hits: usize,
    misses: usize,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: EmbeddingCache) -> Self {
        Self {
            inner,
            cache,
            hits: 0,
            misses: 0,
        }
    }

    /// `(hits, misses)` since construction.
    pub fn hit_stats(&self) -> (usize, usize) {
        (self.hits, self.misses)
    }
}

impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn batch_size(&self) -> usize {
        self.inner.batch_size()
    }

    fn embed_texts(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model_id = self.inner.model_id().to_string();
        let hashes: Vec<String> = texts.iter().map(|t| EmbeddingCache::text_hash(t)).collect();

        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        for hash in &hashes {
            results.push(self.cache.get(&model_id, hash)?);
        }

        let missing: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_none())
            .map(|(i, _)| i)
            .collect();
        self.hits += texts.len() - missing.len();
        self.misses += missing.len();
        let (hits, misses) = self.hit_stats();
        debug!(hits, misses, "embedding cache totals");

        if !missing.is_empty() {
            let miss_texts: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_texts(&miss_texts)?;
            if fresh.len() != miss_texts.len() {
                anyhow::bail!(
                    "Provider returned {} vectors for {} texts",
                    fresh.len(),
                    miss_texts.len()
                );
            }

            let entries: Vec<(String, Vec<f32>)> = missing
                .iter()
                .zip(fresh.iter())
                .map(|(&i, v)| (hashes[i].clone(), v.clone()))
                .collect();
            let stored = self.cache.put_many(&model_id, &entries)?;
            debug!(model = %model_id, misses = missing.len(), stored, "cached embeddings");

            for (&i, vector) in missing.iter().zip(fresh) {
                results[i] = Some(vector);
            }
        }

        Ok(results.into_iter().map(Option::unwrap_or_default).collect())
    }
}
