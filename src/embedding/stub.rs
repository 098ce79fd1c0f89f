use async_trait::async_trait;

use super::{Embedder, EmbeddingError};
use crate::constants::DEFAULT_EMBEDDING_DIM;
use crate::hashing::seeded_unit_vector;

/// Deterministic embedder: the same text always maps to the same unit vector.
///
/// Similarity between different texts is meaningless. Use only for wiring tests
/// and offline runs where no embedding endpoint is configured.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dim: usize,
}

impl StubEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_name(&self) -> &str {
        "stub"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(seeded_unit_vector(text, self.dim))
    }
}
