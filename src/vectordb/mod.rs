//! Vector index collaborator.
//!
//! [`VectorIndex`] is the seam the retrieval layer searches through. [`QdrantIndex`]
//! is the production adapter; [`MockVectorIndex`] is an in-memory stand-in for tests.

pub mod client;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


pub use client::QdrantIndex;
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockPoint, MockVectorIndex};
pub use model::{
    CONTENT_KEYS, Candidate, CandidateMetadata, FieldCondition, FieldMatch, FieldValue,
    NumericRange, SearchFilter,
};

use async_trait::async_trait;

/// kNN search with metadata filtering.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Returns up to `limit` candidates from `collection`, best first by raw cosine similarity.
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Candidate>, VectorDbError>;
}
