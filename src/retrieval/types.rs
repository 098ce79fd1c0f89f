use serde::{Deserialize, Serialize};

use crate::constants::clamp_unit;
use crate::vectordb::Candidate;

/// A candidate with its blended relevance score.
///
/// Lists of hits are ordered by descending `fused_score`; equal scores keep fetch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedHit {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Score in `[0, 1]`.
    pub fused_score: f32,
}

impl RankedHit {
    pub fn new(candidate: Candidate, fused_score: f32) -> Self {
        Self {
            candidate,
            fused_score: clamp_unit(fused_score),
        }
    }

    /// Uses the raw vector score as the fused score.
    pub fn from_vector(candidate: Candidate) -> Self {
        let score = candidate.raw_vector_score;
        Self::new(candidate, score)
    }

    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    pub fn content(&self) -> &str {
        &self.candidate.content
    }

    pub fn source(&self) -> Option<&str> {
        self.candidate.metadata.source.as_deref()
    }
}

/// Knobs for one retrieval call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrieveOptions {
    pub k: usize,
    /// Pool size; defaults to `max(k, 4k)` and is never below `k`.
    pub fetch_k: Option<usize>,
    pub use_mmr: bool,
    /// Overrides the retriever's MMR lambda.
    pub lambda: Option<f32>,
    pub filter: Option<crate::vectordb::SearchFilter>,
}

impl RetrieveOptions {
    pub fn top_k(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn with_fetch_k(mut self, fetch_k: usize) -> Self {
        self.fetch_k = Some(fetch_k);
        self
    }

    pub fn with_mmr(mut self, use_mmr: bool) -> Self {
        self.use_mmr = use_mmr;
        self
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = Some(lambda);
        self
    }

    pub fn with_filter(mut self, filter: crate::vectordb::SearchFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn effective_fetch_k(&self) -> usize {
        self.fetch_k
            .unwrap_or_else(|| crate::constants::default_fetch_k(self.k))
            .max(self.k)
    }
}
