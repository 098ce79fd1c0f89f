use std::sync::Arc;
use tracing::{debug, warn};

use super::error::RetrievalError;
use crate::vectordb::{Candidate, SearchFilter, VectorIndex};

/// kNN call against one collection, with metadata filtering.
#[derive(Clone)]
pub struct CandidateFetcher {
    index: Arc<dyn VectorIndex>,
    collection: String,
}

impl std::fmt::Debug for CandidateFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateFetcher")
            .field("collection", &self.collection)
            .finish()
    }
}

impl CandidateFetcher {
    pub fn new(index: Arc<dyn VectorIndex>, collection: impl Into<String>) -> Self {
        Self {
            index,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Fetches up to `k` candidates, propagating index failures.
    pub async fn try_fetch(
        &self,
        vector: Vec<f32>,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Candidate>, RetrievalError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut candidates = self
            .index
            .search(&self.collection, vector, k as u64, filter)
            .await?;
        candidates.truncate(k);
        Ok(candidates)
    }

    /// Fetches up to `k` candidates; an index failure yields an empty list.
    pub async fn fetch(
        &self,
        vector: Vec<f32>,
        k: usize,
        filter: Option<&SearchFilter>,
    ) -> Vec<Candidate> {
        match self.try_fetch(vector, k, filter).await {
            Ok(candidates) => {
                debug!(
                    collection = %self.collection,
                    k,
                    fetched = candidates.len(),
                    "Fetched candidates"
                );
                candidates
            }
            Err(e) => {
                warn!(
                    collection = %self.collection,
                    error = %e,
                    "Vector search failed, continuing with no candidates"
                );
                Vec::new()
            }
        }
    }
}
