//! Candidate retrieval and ranking.
//!
//! Data flow: query text is embedded, [`CandidateFetcher`] pulls a `fetch_k` pool from the
//! vector index, [`ScoreFusion`] blends vector and BM25 relevance over that pool, and
//! [`DiversityReranker`] optionally reorders it with MMR.
//!
//! BM25 here is deliberately local: idf is computed over the fetched pool, not a global
//! index, so scores are only comparable within one call.

pub mod citations;
pub mod error;
pub mod fetcher;
pub mod fusion;
pub mod lexical;
pub mod mmr;
pub mod retriever;
pub mod types;


pub use citations::{Citation, build_citations};
pub use error::RetrievalError;
pub use fetcher::CandidateFetcher;
pub use fusion::{ScoreFusion, min_max_normalize};
pub use lexical::{Bm25Scorer, LexicalScorer, NullLexicalScorer, tokenize};
pub use mmr::{DiversityReranker, mmr_select};
pub use retriever::{Retriever, RetrieverConfig};
pub use types::{RankedHit, RetrieveOptions};
