use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::normalizer::TermNormalizer;
use super::scorer::{CoverageConfidenceScorer, confidence, coverage, glossary_hit};
use super::types::{ScoringThresholds, ValidationResult, violation_weight};
use super::violations::ViolationEngine;
use crate::constants::{
    DEFAULT_MMR_LAMBDA, GLOSSARY_QUERY_CHARS, GUIDELINE_QUERY_CHARS, truncate_chars,
};
use crate::retrieval::{RetrieveOptions, Retriever, build_citations};
use crate::section::normalize_section;

const GUIDELINE_K: usize = 5;
const GLOSSARY_K: usize = 5;
const RETRY_K: usize = 3;
const RETRY_FETCH_K: usize = 10;

/// `Validate(section, content, autoFix)`: retrieval, violation detection and scoring.
#[derive(Debug, Clone)]
pub struct Validator {
    guidelines: Retriever,
    glossary: Option<Retriever>,
    violations: ViolationEngine,
    scorer: CoverageConfidenceScorer,
    normalizer: Option<Arc<TermNormalizer>>,
}

impl Validator {
    pub fn new(
        guidelines: Retriever,
        violations: ViolationEngine,
        scorer: CoverageConfidenceScorer,
    ) -> Self {
        Self {
            guidelines,
            glossary: None,
            violations,
            scorer,
            normalizer: None,
        }
    }

    pub fn with_glossary(mut self, glossary: Retriever) -> Self {
        self.glossary = Some(glossary);
        self
    }

    pub fn with_normalizer(mut self, normalizer: TermNormalizer) -> Self {
        self.normalizer = Some(Arc::new(normalizer));
        self
    }

    pub fn thresholds(&self) -> ScoringThresholds {
        self.scorer.thresholds()
    }

    /// Scores `content` against the guidance for `section`.
    ///
    /// Never fails: retrieval problems show up as low coverage and confidence.
    #[instrument(skip(self, content), fields(chars = content.chars().count()))]
    pub async fn validate(&self, section: &str, content: &str, auto_fix: bool) -> ValidationResult {
        let section = normalize_section(section);

        let mut hits = self
            .guidelines
            .retrieve(
                truncate_chars(content, GUIDELINE_QUERY_CHARS),
                Some(&section),
                GUIDELINE_K,
                false,
            )
            .await;

        let violations = self.violations.detect(content, &hits).await;

        let normalized_content = match &self.normalizer {
            Some(normalizer) if auto_fix && !violations.is_empty() => normalizer.normalize(content),
            _ => content.to_string(),
        };

        let glossary_hits = match &self.glossary {
            Some(glossary) => {
                glossary
                    .retrieve(
                        truncate_chars(&normalized_content, GLOSSARY_QUERY_CHARS),
                        None,
                        GLOSSARY_K,
                        false,
                    )
                    .await
            }
            None => Vec::new(),
        };

        let mut cov = coverage(&hits);
        let conf = confidence(&hits);

        if self.scorer.needs_retry(cov) {
            let options = RetrieveOptions::top_k(RETRY_K)
                .with_fetch_k(RETRY_FETCH_K)
                .with_mmr(true)
                .with_lambda(DEFAULT_MMR_LAMBDA);
            let extra = self
                .guidelines
                .search(
                    truncate_chars(&normalized_content, GUIDELINE_QUERY_CHARS),
                    &options,
                )
                .await;
            debug!(before = cov, added = extra.len(), "Coverage below minimum, widening once");
            hits.extend(extra);
            cov = coverage(&hits);
        }

        let breakdown = self.scorer.combine(
            cov,
            conf,
            glossary_hit(&glossary_hits),
            violation_weight(&violations),
        );
        let citations = build_citations(&hits, None);

        info!(
            section = %section,
            passed = breakdown.passed,
            score = breakdown.score,
            violations = violations.len(),
            "Validation complete"
        );

        ValidationResult {
            passed: breakdown.passed,
            coverage: breakdown.coverage,
            confidence: breakdown.confidence,
            glossary_hit: breakdown.glossary_hit,
            violation_weight: breakdown.violation_weight,
            score_raw: breakdown.score_raw,
            score: breakdown.score,
            violations,
            citations,
            thresholds: self.scorer.thresholds(),
            normalized_content,
        }
    }
}
