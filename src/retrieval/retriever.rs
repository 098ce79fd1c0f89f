use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::fetcher::CandidateFetcher;
use super::fusion::ScoreFusion;
use super::lexical::{Bm25Scorer, LexicalScorer, NullLexicalScorer};
use super::mmr::DiversityReranker;
use super::types::{RankedHit, RetrieveOptions};
use crate::constants::{
    DEFAULT_HYBRID_ALPHA, DEFAULT_MMR_LAMBDA, DEFAULT_PASSAGE_PREFIX, DEFAULT_QUERY_PREFIX,
};
use crate::embedding::{Embedder, prefixed_input};
use crate::vectordb::{SearchFilter, VectorIndex};

/// Retriever tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrieverConfig {
    pub alpha: f32,
    pub lambda: f32,
    pub lexical: bool,
    pub query_prefix: String,
    pub passage_prefix: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_HYBRID_ALPHA,
            lambda: DEFAULT_MMR_LAMBDA,
            lexical: true,
            query_prefix: DEFAULT_QUERY_PREFIX.to_string(),
            passage_prefix: DEFAULT_PASSAGE_PREFIX.to_string(),
        }
    }
}

impl RetrieverConfig {
    /// Vector-only ranking (raw similarity becomes the fused score).
    pub fn vector_only() -> Self {
        Self {
            lexical: false,
            ..Default::default()
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_lambda(mut self, lambda: f32) -> Self {
        self.lambda = lambda;
        self
    }
}

/// Query-to-hits pipeline over one collection: embed, fetch, fuse, optionally diversify.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    fetcher: CandidateFetcher,
    fusion: ScoreFusion,
    reranker: DiversityReranker,
    query_prefix: String,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("fetcher", &self.fetcher)
            .field("fusion", &self.fusion)
            .field("reranker", &self.reranker)
            .finish()
    }
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        config: RetrieverConfig,
    ) -> Self {
        let lexical: Arc<dyn LexicalScorer> = if config.lexical {
            Arc::new(Bm25Scorer::default())
        } else {
            Arc::new(NullLexicalScorer)
        };
        Self::with_lexical(embedder, index, collection, config, lexical)
    }

    /// Builds a retriever with an explicit lexical capability.
    pub fn with_lexical(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        collection: impl Into<String>,
        config: RetrieverConfig,
        lexical: Arc<dyn LexicalScorer>,
    ) -> Self {
        Self {
            fetcher: CandidateFetcher::new(index, collection),
            fusion: ScoreFusion::new(config.alpha, lexical),
            reranker: DiversityReranker::new(embedder.clone())
                .with_lambda(config.lambda)
                .with_passage_prefix(config.passage_prefix),
            embedder,
            query_prefix: config.query_prefix,
        }
    }

    pub fn collection(&self) -> &str {
        self.fetcher.collection()
    }

    /// Hits for `query` restricted to `module` (when given).
    pub async fn retrieve(
        &self,
        query: &str,
        module: Option<&str>,
        k: usize,
        use_mmr: bool,
    ) -> Vec<RankedHit> {
        let mut options = RetrieveOptions::top_k(k).with_mmr(use_mmr);
        if let Some(module) = module.filter(|m| !m.is_empty()) {
            options = options.with_filter(SearchFilter::new().eq("module", module));
        }
        self.search(query, &options).await
    }

    /// Runs one retrieval. External failures degrade to an empty (or un-diversified) result.
    #[instrument(skip(self, query, options), fields(collection = %self.collection(), k = options.k, use_mmr = options.use_mmr))]
    pub async fn search(&self, query: &str, options: &RetrieveOptions) -> Vec<RankedHit> {
        if options.k == 0 || query.trim().is_empty() {
            return Vec::new();
        }

        let query_vector = match self
            .embedder
            .embed(&prefixed_input(&self.query_prefix, query))
            .await
        {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Query embedding failed, returning no hits");
                return Vec::new();
            }
        };

        let fetch_k = options.effective_fetch_k();
        let candidates = self
            .fetcher
            .fetch(query_vector.clone(), fetch_k, options.filter.as_ref())
            .await;
        if candidates.is_empty() {
            return Vec::new();
        }

        if !options.use_mmr {
            return self.fusion.fuse(query, candidates, options.k);
        }

        let pool = self.fusion.fuse(query, candidates, fetch_k);
        let lambda = options.lambda.unwrap_or_else(|| self.reranker.lambda());
        match self
            .reranker
            .rerank_with_lambda(&query_vector, pool.clone(), options.k, lambda)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "Passage embedding failed, falling back to fused order");
                let mut pool = pool;
                pool.truncate(options.k);
                debug!(returned = pool.len(), "MMR fallback");
                pool
            }
        }
    }
}
