//! Content validation: violation detection, coverage/confidence scoring and auto-fix.
//!
//! [`Validator::validate`] retrieves section guidance, runs the [`ViolationEngine`]
//! detectors, optionally rewrites terminology with a [`TermNormalizer`], and folds the
//! results into a [`ValidationResult`] via [`CoverageConfidenceScorer`].
//!
//! # Scoring
//!
//! - `coverage = 0.6 * avg(top-5 fused) + 0.4 * min(1, hits / 5)`
//! - `confidence = avg(top-3 fused)`
//! - `score = max(0, 0.55 * coverage + 0.30 * confidence + 0.15 * glossary - 0.05 * weight)`
//!
//! A coverage below the minimum triggers exactly one widened MMR retrieval.

pub mod error;
pub mod normalizer;
pub mod scorer;
pub mod types;
pub mod validator;
pub mod violations;


pub use error::ScoringError;
pub use normalizer::{TermNormalizer, TermRule};
pub use scorer::{CoverageConfidenceScorer, ScoreBreakdown, confidence, coverage, glossary_hit};
pub use types::{
    ScoringThresholds, Severity, ValidationResult, Violation, ViolationKind, violation_weight,
};
pub use validator::Validator;
pub use violations::{
    DEFAULT_RED_FLAGS, GuidelineTier, SeverityBand, TerminologyCheck, TierSearch, ViolationConfig,
    ViolationEngine,
};
