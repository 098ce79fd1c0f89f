use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, warn};

use super::lexical::{LexicalScorer, NullLexicalScorer};
use super::types::RankedHit;
use crate::constants::{DEFAULT_HYBRID_ALPHA, clamp_unit};
use crate::vectordb::Candidate;

/// Min-max normalizes to `[0, 1]`. A constant (or empty) input maps to all zeros.
pub fn min_max_normalize(values: &[f32]) -> Vec<f32> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let range = max - min;
    if !range.is_finite() || range <= f32::EPSILON {
        return vec![0.0; values.len()];
    }

    values
        .iter()
        .map(|v| {
            if v.is_finite() {
                clamp_unit((v - min) / range)
            } else {
                0.0
            }
        })
        .collect()
}

/// Blends vector and lexical relevance into one ranked list.
#[derive(Clone)]
pub struct ScoreFusion {
    alpha: f32,
    lexical: Arc<dyn LexicalScorer>,
}

impl std::fmt::Debug for ScoreFusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreFusion")
            .field("alpha", &self.alpha)
            .finish()
    }
}

impl Default for ScoreFusion {
    fn default() -> Self {
        Self::new(DEFAULT_HYBRID_ALPHA, Arc::new(NullLexicalScorer))
    }
}

impl ScoreFusion {
    pub fn new(alpha: f32, lexical: Arc<dyn LexicalScorer>) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            lexical,
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Ranks `candidates` (in vector order) for `query` and keeps the best `k`.
    ///
    /// Without lexical scores the vector list is truncated unchanged.
    pub fn fuse(&self, query: &str, candidates: Vec<Candidate>, k: usize) -> Vec<RankedHit> {
        if candidates.is_empty() || k == 0 {
            return Vec::new();
        }

        let documents: Vec<&str> = candidates.iter().map(|c| c.content.as_str()).collect();
        let lexical = match self.lexical.scores(query, &documents) {
            Some(scores) if scores.len() == candidates.len() => Some(scores),
            Some(scores) => {
                warn!(
                    expected = candidates.len(),
                    actual = scores.len(),
                    "Lexical scorer returned a mismatched score vector, using vector order"
                );
                None
            }
            None => None,
        };

        let Some(bm25) = lexical else {
            debug!(pool = candidates.len(), k, "Lexical scoring disabled");
            return candidates
                .into_iter()
                .take(k)
                .map(RankedHit::from_vector)
                .collect();
        };

        let vector_scores: Vec<f32> = candidates.iter().map(|c| c.raw_vector_score).collect();
        let vector_norm = min_max_normalize(&vector_scores);
        let bm25_norm = min_max_normalize(&bm25);

        let mut hits: Vec<RankedHit> = candidates
            .into_iter()
            .zip(vector_norm.iter().zip(&bm25_norm))
            .map(|(candidate, (v, b))| {
                RankedHit::new(candidate, self.alpha * v + (1.0 - self.alpha) * b)
            })
            .collect();

        // Stable: equal scores keep vector rank.
        hits.sort_by(|a, b| {
            b.fused_score
                .partial_cmp(&a.fused_score)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(k);

        debug!(
            alpha = self.alpha,
            k,
            top = hits.first().map(|h| h.fused_score),
            "Hybrid fusion complete"
        );

        hits
    }
}
