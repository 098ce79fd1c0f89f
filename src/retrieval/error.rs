use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::vectordb::VectorDbError;

/// Failure of an external call during retrieval.
///
/// Never escapes the retrieval layer: callers log it and continue with an empty result.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector search failed: {0}")]
    Search(#[from] VectorDbError),
}
