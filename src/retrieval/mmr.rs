//! Maximal marginal relevance reranking.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::types::RankedHit;
use crate::constants::{DEFAULT_MMR_LAMBDA, DEFAULT_PASSAGE_PREFIX};
use crate::embedding::{Embedder, EmbeddingError, cosine_similarity, prefixed_input};

/// Greedy MMR selection over `docs`; returns selected indices in pick order.
///
/// The first pick maximizes similarity to the query. Each later pick maximizes
/// `lambda * sim(q, d) - (1 - lambda) * max_{s in selected} sim(d, s)`.
/// Ties go to the lowest index, so `lambda = 1` reproduces top-k by similarity.
pub fn mmr_select(query: &[f32], docs: &[Vec<f32>], k: usize, lambda: f32) -> Vec<usize> {
    let n = docs.len();
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }

    let lambda = lambda.clamp(0.0, 1.0);
    let sim_to_query: Vec<f32> = docs.iter().map(|d| cosine_similarity(query, d)).collect();

    let mut chosen = vec![false; n];
    let mut selected: Vec<usize> = Vec::with_capacity(k);
    // Running max similarity of each document to the selected set.
    let mut redundancy = vec![f32::NEG_INFINITY; n];

    while selected.len() < k {
        let mut best: Option<(usize, f32)> = None;
        for i in (0..n).filter(|&i| !chosen[i]) {
            let score = if selected.is_empty() {
                sim_to_query[i]
            } else {
                lambda * sim_to_query[i] - (1.0 - lambda) * redundancy[i]
            };
            if best.is_none_or(|(_, b)| score > b) {
                best = Some((i, score));
            }
        }

        let Some((pick, _)) = best else {
            break;
        };
        chosen[pick] = true;
        selected.push(pick);

        for i in (0..n).filter(|&i| !chosen[i]) {
            redundancy[i] = redundancy[i].max(cosine_similarity(&docs[i], &docs[pick]));
        }
    }

    selected
}

/// Reorders a hit pool for diversity using passage embeddings.
#[derive(Clone)]
pub struct DiversityReranker {
    embedder: Arc<dyn Embedder>,
    lambda: f32,
    passage_prefix: String,
}

impl std::fmt::Debug for DiversityReranker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiversityReranker")
            .field("lambda", &self.lambda)
            .field("passage_prefix", &self.passage_prefix)
            .finish()
    }
}

impl DiversityReranker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            lambda: DEFAULT_MMR_LAMBDA,
            passage_prefix: DEFAULT_PASSAGE_PREFIX.to_string(),
        }
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }

    pub fn with_passage_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.passage_prefix = prefix.into();
        self
    }

    pub fn lambda(&self) -> f32 {
        self.lambda
    }

    /// Picks `k` hits from `pool` with the configured lambda.
    pub async fn rerank(
        &self,
        query_vector: &[f32],
        pool: Vec<RankedHit>,
        k: usize,
    ) -> Result<Vec<RankedHit>, EmbeddingError> {
        self.rerank_with_lambda(query_vector, pool, k, self.lambda)
            .await
    }

    /// Picks `k` hits from `pool`. Repeated candidate ids are collapsed to their first occurrence.
    pub async fn rerank_with_lambda(
        &self,
        query_vector: &[f32],
        pool: Vec<RankedHit>,
        k: usize,
        lambda: f32,
    ) -> Result<Vec<RankedHit>, EmbeddingError> {
        let mut seen = HashSet::new();
        let pool: Vec<RankedHit> = pool
            .into_iter()
            .filter(|h| seen.insert(h.id().to_string()))
            .collect();

        if pool.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = pool
            .iter()
            .map(|h| prefixed_input(&self.passage_prefix, h.content()))
            .collect();
        let doc_vectors = self.embedder.embed_batch(&texts).await?;

        let order = mmr_select(query_vector, &doc_vectors, k, lambda);
        debug!(pool = pool.len(), k, lambda, picked = order.len(), "MMR rerank");

        let mut slots: Vec<Option<RankedHit>> = pool.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }
}
