//! Rule detectors producing severity-weighted violations.

use futures_util::future::join_all;
use tracing::debug;

use super::types::{Severity, Violation, ViolationKind};
use crate::constants::{GUIDELINE_QUERY_CHARS, TERMINOLOGY_QUERY_CHARS, truncate_chars};
use crate::retrieval::{RankedHit, RetrieveOptions, Retriever};
use crate::vectordb::SearchFilter;

/// Red-flag phrases matched case-insensitively as substrings.
pub const DEFAULT_RED_FLAGS: [&str; 7] = [
    "tbd",
    "to be defined",
    "to be decided",
    "미정",
    "lorem ipsum",
    "as appropriate",
    "etc.",
];

/// Where a tier's hits come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierSearch {
    /// The guideline hits already retrieved for the section, filtered by tier source.
    Primary,
    /// A dedicated search of the reference collection filtered by tier source.
    Reference,
}

/// A similarity ceiling below which a hit earns `severity`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityBand {
    pub below: f32,
    pub severity: Severity,
}

impl SeverityBand {
    pub fn new(below: f32, severity: Severity) -> Self {
        Self { below, severity }
    }
}

/// One reference tier and its threshold-to-severity table.
#[derive(Debug, Clone, PartialEq)]
pub struct GuidelineTier {
    /// Source tag the tier's hits carry (`metadata.source`).
    pub source: String,
    pub search: TierSearch,
    /// Hits requested for [`TierSearch::Reference`] tiers.
    pub k: usize,
    pub bands: Vec<SeverityBand>,
}

impl GuidelineTier {
    pub fn new(source: impl Into<String>, search: TierSearch) -> Self {
        Self {
            source: source.into(),
            search,
            k: 5,
            bands: Vec::new(),
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_band(mut self, below: f32, severity: Severity) -> Self {
        self.bands.push(SeverityBand::new(below, severity));
        self
    }

    /// ICH tier: reference search, `< 0.85` minor, `< 0.75` major.
    pub fn ich() -> Self {
        Self::new("ICH", TierSearch::Reference)
            .with_k(5)
            .with_band(0.85, Severity::Minor)
            .with_band(0.75, Severity::Major)
    }

    /// MFDS tier: primary guideline hits, `< 0.80` major, `< 0.70` critical.
    pub fn mfds() -> Self {
        Self::new("MFDS", TierSearch::Primary)
            .with_band(0.80, Severity::Major)
            .with_band(0.70, Severity::Critical)
    }

    /// Most severe band whose ceiling is above `score`, if any.
    pub fn classify(&self, score: f32) -> Option<Severity> {
        self.bands
            .iter()
            .filter(|band| score < band.below)
            .map(|band| band.severity)
            .max()
    }
}

/// Terminology detector settings.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminologyCheck {
    pub source: String,
    pub k: usize,
    pub min_score: f32,
}

impl Default for TerminologyCheck {
    fn default() -> Self {
        Self {
            source: "GLOSSARY".to_string(),
            k: 3,
            min_score: 0.75,
        }
    }
}

/// Detector configuration. Every detector is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationConfig {
    pub tiers: Vec<GuidelineTier>,
    pub terminology: Option<TerminologyCheck>,
    pub red_flags: Vec<String>,
}

impl Default for ViolationConfig {
    fn default() -> Self {
        Self {
            tiers: vec![GuidelineTier::ich(), GuidelineTier::mfds()],
            terminology: Some(TerminologyCheck::default()),
            red_flags: DEFAULT_RED_FLAGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ViolationConfig {
    /// No detectors at all.
    pub fn empty() -> Self {
        Self {
            tiers: Vec::new(),
            terminology: None,
            red_flags: Vec::new(),
        }
    }

    pub fn with_tiers(mut self, tiers: Vec<GuidelineTier>) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_terminology(mut self, check: Option<TerminologyCheck>) -> Self {
        self.terminology = check;
        self
    }

    pub fn with_red_flags<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.red_flags = phrases.into_iter().map(Into::into).collect();
        self
    }
}

/// Runs the guideline-tier, terminology and red-flag detectors.
///
/// Similarity detectors fan out concurrently; output order is fixed as tiers (in
/// configured order), then terminology, then red flags.
#[derive(Debug, Clone)]
pub struct ViolationEngine {
    config: ViolationConfig,
    reference: Option<Retriever>,
}

impl ViolationEngine {
    pub fn new(config: ViolationConfig) -> Self {
        Self {
            config,
            reference: None,
        }
    }

    /// Retriever over the reference collection used by reference tiers and terminology.
    pub fn with_reference(mut self, retriever: Retriever) -> Self {
        self.reference = Some(retriever);
        self
    }

    pub fn config(&self) -> &ViolationConfig {
        &self.config
    }

    pub async fn detect(&self, content: &str, primary_hits: &[RankedHit]) -> Vec<Violation> {
        let tier_checks = join_all(
            self.config
                .tiers
                .iter()
                .map(|tier| self.check_tier(tier, content, primary_hits)),
        );
        let (tier_results, terminology) =
            futures_util::join!(tier_checks, self.check_terminology(content));

        let mut violations: Vec<Violation> = tier_results.into_iter().flatten().collect();
        violations.extend(terminology);
        violations.extend(self.check_red_flags(content));

        debug!(count = violations.len(), "Detected violations");
        violations
    }

    async fn check_tier(
        &self,
        tier: &GuidelineTier,
        content: &str,
        primary_hits: &[RankedHit],
    ) -> Vec<Violation> {
        let hits: Vec<RankedHit> = match tier.search {
            TierSearch::Primary => primary_hits
                .iter()
                .filter(|h| h.source() == Some(tier.source.as_str()))
                .cloned()
                .collect(),
            TierSearch::Reference => {
                let Some(reference) = &self.reference else {
                    return Vec::new();
                };
                let options = RetrieveOptions::top_k(tier.k)
                    .with_filter(SearchFilter::new().eq("source", tier.source.as_str()));
                reference
                    .search(truncate_chars(content, GUIDELINE_QUERY_CHARS), &options)
                    .await
            }
        };

        hits.iter()
            .filter_map(|hit| {
                let severity = tier.classify(hit.fused_score)?;
                let md = &hit.candidate.metadata;
                let module = md.module.as_deref().unwrap_or("N/A");
                let title = md.title.as_deref().or(md.doc_label()).unwrap_or("N/A");
                let violation = Violation::new(
                    ViolationKind::Guideline,
                    severity,
                    format!("weak match with {} {module} guidance", tier.source),
                    format!("review {} guidance: {title}", tier.source),
                )
                .with_source_ref(tier.source.clone())
                .with_score(hit.fused_score);
                Some(violation)
            })
            .collect()
    }

    async fn check_terminology(&self, content: &str) -> Vec<Violation> {
        let (Some(check), Some(reference)) = (&self.config.terminology, &self.reference) else {
            return Vec::new();
        };

        let options = RetrieveOptions::top_k(check.k)
            .with_filter(SearchFilter::new().eq("source", check.source.as_str()));
        let hits = reference
            .search(truncate_chars(content, TERMINOLOGY_QUERY_CHARS), &options)
            .await;

        hits.iter()
            .filter(|hit| hit.fused_score < check.min_score)
            .map(|hit| {
                let md = &hit.candidate.metadata;
                let term = md.canonical_term().unwrap_or("N/A");
                let suggestion = match (&md.term, &md.term_en) {
                    (Some(ko), Some(en)) => format!("use the standard term: {ko} ({en})"),
                    _ => format!("use the standard term: {term}"),
                };
                Violation::new(
                    ViolationKind::Terminology,
                    Severity::Minor,
                    "possible non-standard terminology",
                    suggestion,
                )
                .with_source_ref(check.source.clone())
                .with_score(hit.fused_score)
            })
            .collect()
    }

    fn check_red_flags(&self, content: &str) -> Option<Violation> {
        let lowered = content.to_lowercase();
        let matched: Vec<&str> = self
            .config
            .red_flags
            .iter()
            .map(String::as_str)
            .filter(|phrase| !phrase.is_empty() && lowered.contains(&phrase.to_lowercase()))
            .collect();

        if matched.is_empty() {
            return None;
        }

        Some(Violation::new(
            ViolationKind::Placeholder,
            Severity::Major,
            format!("placeholder text detected: {}", matched.join(", ")),
            "replace placeholders with actual values",
        ))
    }
}
