//! Embedding collaborators.
//!
//! - [`Embedder`] is the injected seam: the core never constructs a model itself.
//! - [`HttpEmbedder`] talks to an OpenAI-compatible `/embeddings` endpoint.
//! - [`StubEmbedder`] produces deterministic BLAKE3-seeded vectors for offline runs.
//! - [`CachedEmbedder`] wraps any embedder with a bounded in-memory cache.

/// Bounded embedding cache.
pub mod cache;
mod error;
/// HTTP embedder.
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Deterministic stub embedder.
pub mod stub;


pub use cache::CachedEmbedder;
pub use error::EmbeddingError;
pub use http::HttpEmbedder;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use stub::StubEmbedder;

use async_trait::async_trait;

/// Text-to-vector collaborator.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier (part of cache keys).
    fn model_name(&self) -> &str;

    /// Output vector length.
    fn dimension(&self) -> usize;

    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embeds many texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Collapses runs of whitespace and prepends `prefix`.
pub fn prefixed_input(prefix: &str, text: &str) -> String {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
    format!("{prefix}{normalized}")
}

/// Cosine similarity; `0.0` for empty, mismatched or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let (dot, norm_a_sq, norm_b_sq) = a
        .iter()
        .zip(b.iter())
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let norm_a = norm_a_sq.sqrt();
    let norm_b = norm_b_sq.sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
