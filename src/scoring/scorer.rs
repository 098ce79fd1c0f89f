use tracing::debug;

use super::types::{ScoringThresholds, Violation, violation_weight};
use crate::constants::{CONFIDENCE_TOP_N, COVERAGE_TOP_N, VIOLATION_PENALTY, clamp_unit};
use crate::retrieval::RankedHit;

const COVERAGE_QUALITY_WEIGHT: f32 = 0.6;
const COVERAGE_COUNT_WEIGHT: f32 = 0.4;
const SCORE_COVERAGE_WEIGHT: f32 = 0.55;
const SCORE_CONFIDENCE_WEIGHT: f32 = 0.30;
const SCORE_GLOSSARY_WEIGHT: f32 = 0.15;

/// Numbers behind a pass/fail decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub coverage: f32,
    pub confidence: f32,
    pub glossary_hit: f32,
    pub violation_weight: u32,
    pub score_raw: f32,
    pub score: f32,
    pub passed: bool,
}

fn mean_fused(hits: &[RankedHit]) -> f32 {
    if hits.is_empty() {
        return 0.0;
    }
    hits.iter().map(|h| h.fused_score).sum::<f32>() / hits.len() as f32
}

/// `0.6 * avg(top-5 fused) + 0.4 * min(1, n / 5)`, where `n` counts every hit.
pub fn coverage(hits: &[RankedHit]) -> f32 {
    if hits.is_empty() {
        return 0.0;
    }
    let top = &hits[..hits.len().min(COVERAGE_TOP_N)];
    let count = (hits.len() as f32 / COVERAGE_TOP_N as f32).min(1.0);
    clamp_unit(COVERAGE_QUALITY_WEIGHT * mean_fused(top) + COVERAGE_COUNT_WEIGHT * count)
}

/// Average fused score of the top-3 hits.
pub fn confidence(hits: &[RankedHit]) -> f32 {
    clamp_unit(mean_fused(&hits[..hits.len().min(CONFIDENCE_TOP_N)]))
}

/// Average score of glossary hits; `0` when there are none.
pub fn glossary_hit(glossary_hits: &[RankedHit]) -> f32 {
    clamp_unit(mean_fused(glossary_hits))
}

/// Aggregates hits and violations into coverage, confidence, score and a verdict.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageConfidenceScorer {
    thresholds: ScoringThresholds,
}

impl CoverageConfidenceScorer {
    pub fn new(thresholds: ScoringThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> ScoringThresholds {
        self.thresholds
    }

    /// True when coverage is low enough to justify one widened retrieval.
    pub fn needs_retry(&self, coverage: f32) -> bool {
        coverage < self.thresholds.coverage_min
    }

    pub fn score(
        &self,
        hits: &[RankedHit],
        glossary_hits: &[RankedHit],
        violations: &[Violation],
    ) -> ScoreBreakdown {
        self.combine(
            coverage(hits),
            confidence(hits),
            glossary_hit(glossary_hits),
            violation_weight(violations),
        )
    }

    /// Combines already computed components.
    ///
    /// `passed` fails whenever `violation_weight > violation_max`, whatever the other values.
    pub fn combine(
        &self,
        coverage: f32,
        confidence: f32,
        glossary_hit: f32,
        violation_weight: u32,
    ) -> ScoreBreakdown {
        let coverage = clamp_unit(coverage);
        let confidence = clamp_unit(confidence);
        let glossary_hit = clamp_unit(glossary_hit);

        let score_raw = clamp_unit(
            SCORE_COVERAGE_WEIGHT * coverage
                + SCORE_CONFIDENCE_WEIGHT * confidence
                + SCORE_GLOSSARY_WEIGHT * glossary_hit,
        );
        let score = clamp_unit(score_raw - VIOLATION_PENALTY * violation_weight as f32);

        let t = &self.thresholds;
        let passed = coverage >= t.coverage_min
            && confidence >= t.confidence_min
            && violation_weight <= t.violation_max;

        debug!(
            coverage,
            confidence, glossary_hit, violation_weight, score, passed, "Scored content"
        );

        ScoreBreakdown {
            coverage,
            confidence,
            glossary_hit,
            violation_weight,
            score_raw,
            score,
            passed,
        }
    }
}
