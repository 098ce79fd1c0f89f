use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::embedding::cosine_similarity;
use crate::vectordb::{Candidate, CandidateMetadata, SearchFilter, VectorDbError, VectorIndex};

/// Stored passage for [`MockVectorIndex`].
#[derive(Debug, Clone)]
pub struct MockPoint {
    pub id: String,
    pub content: String,
    pub metadata: CandidateMetadata,
    pub vector: Vec<f32>,
    /// When set, returned as the raw score regardless of the query vector.
    pub fixed_score: Option<f32>,
}

impl MockPoint {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: CandidateMetadata::default(),
            vector: Vec::new(),
            fixed_score: None,
        }
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = vector;
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.fixed_score = Some(score);
        self
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// In-memory, filter-aware kNN index.
///
/// Points keep insertion order so equal scores tie-break deterministically.
#[derive(Default)]
pub struct MockVectorIndex {
    collections: RwLock<HashMap<String, Vec<MockPoint>>>,
    failing: AtomicBool,
    searches: AtomicUsize,
}

impl MockVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, collection: &str, point: MockPoint) {
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .push(point);
    }

    pub fn with_point(self, collection: &str, point: MockPoint) -> Self {
        self.insert(collection, point);
        self
    }

    pub fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections.read().get(collection).map(Vec::len)
    }

    /// Makes every subsequent search fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of searches issued so far.
    pub fn search_count(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Candidate>, VectorDbError> {
        self.searches.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: "mock index configured to fail".to_string(),
            });
        }

        let collections = self.collections.read();
        let points =
            collections
                .get(collection)
                .ok_or_else(|| VectorDbError::CollectionNotFound {
                    collection: collection.to_string(),
                })?;

        let mut results: Vec<Candidate> = points
            .iter()
            .filter(|p| filter.is_none_or(|f| f.matches(&p.metadata)))
            .map(|p| {
                let score = p
                    .fixed_score
                    .unwrap_or_else(|| cosine_similarity(&vector, &p.vector));
                Candidate::new(p.id.clone(), p.content.clone(), score)
                    .with_metadata(p.metadata.clone())
            })
            .collect();

        results.sort_by(|a, b| {
            b.raw_vector_score
                .partial_cmp(&a.raw_vector_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        results.truncate(limit as usize);
        Ok(results)
    }
}
