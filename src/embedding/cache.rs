use async_trait::async_trait;
use moka::sync::Cache;
use std::sync::Arc;
use tracing::debug;

use super::{Embedder, EmbeddingError};
use crate::hashing::hash_embedding_key;

/// Embedder decorator that memoizes vectors keyed by `BLAKE3(model | text)`.
///
/// Shared across runs; the wrapped embedder is only called on misses.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    entries: Cache<[u8; 32], Arc<Vec<f32>>>,
}

impl std::fmt::Debug for CachedEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbedder")
            .field("model", &self.inner.model_name())
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}

impl CachedEmbedder {
    const DEFAULT_CAPACITY: u64 = 10_000;

    pub fn new(inner: Arc<dyn Embedder>) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn Embedder>, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    fn key(&self, text: &str) -> [u8; 32] {
        hash_embedding_key(self.inner.model_name(), text)
    }

    /// Returns `true` if `text` is cached.
    pub fn contains(&self, text: &str) -> bool {
        self.entries.contains_key(&self.key(text))
    }

    pub fn clear(&self) {
        self.entries.invalidate_all();
    }
}

#[async_trait]
impl Embedder for CachedEmbedder {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = self.key(text);
        if let Some(hit) = self.entries.get(&key) {
            return Ok(hit.as_ref().clone());
        }

        let vector = self.inner.embed(text).await?;
        self.entries.insert(key, Arc::new(vector.clone()));
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let keys: Vec<[u8; 32]> = texts.iter().map(|t| self.key(t)).collect();
        let mut slots: Vec<Option<Vec<f32>>> = keys
            .iter()
            .map(|k| self.entries.get(k).map(|v| v.as_ref().clone()))
            .collect();

        let missing: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.is_none().then_some(i))
            .collect();

        debug!(
            total = texts.len(),
            misses = missing.len(),
            "Embedding cache batch lookup"
        );

        if !missing.is_empty() {
            let to_embed: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&to_embed).await?;
            if fresh.len() != missing.len() {
                return Err(EmbeddingError::InvalidResponse {
                    reason: format!(
                        "expected {} embeddings, got {}",
                        missing.len(),
                        fresh.len()
                    ),
                });
            }
            for (idx, vector) in missing.into_iter().zip(fresh) {
                self.entries.insert(keys[idx], Arc::new(vector.clone()));
                slots[idx] = Some(vector);
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
