use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ScoringError;
use crate::constants::{
    DEFAULT_CONFIDENCE_MIN, DEFAULT_COVERAGE_MIN, DEFAULT_GENERATE_GATE, DEFAULT_VIOLATION_MAX,
};
use crate::retrieval::Citation;

/// Finding severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// Fixed weight used in violation sums: minor 1, major 2, critical 4.
    pub fn weight(self) -> u32 {
        match self {
            Severity::Minor => 1,
            Severity::Major => 2,
            Severity::Critical => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ScoringError;

    /// Accepts `minor|major|critical` and the `low|medium|high` aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" | "low" => Ok(Severity::Minor),
            "major" | "medium" => Ok(Severity::Major),
            "critical" | "high" => Ok(Severity::Critical),
            other => Err(ScoringError::InvalidSeverity {
                value: other.to_string(),
            }),
        }
    }
}

/// Which detector produced a violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    Guideline,
    Terminology,
    Placeholder,
}

/// One rule-engine finding against the content under review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub severity: Severity,
    pub description: String,
    pub suggestion: String,
    /// Tier tag or document the finding refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    /// Similarity that triggered the finding (similarity-based detectors only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl Violation {
    pub fn new(
        kind: ViolationKind,
        severity: Severity,
        description: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            suggestion: suggestion.into(),
            source_ref: None,
            score: None,
        }
    }

    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Sum of severity weights.
pub fn violation_weight(violations: &[Violation]) -> u32 {
    violations.iter().map(|v| v.severity.weight()).sum()
}

/// Pass/fail thresholds reported alongside every validation result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringThresholds {
    pub coverage_min: f32,
    pub confidence_min: f32,
    pub violation_max: u32,
    pub generate_gate: f32,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            coverage_min: DEFAULT_COVERAGE_MIN,
            confidence_min: DEFAULT_CONFIDENCE_MIN,
            violation_max: DEFAULT_VIOLATION_MAX,
            generate_gate: DEFAULT_GENERATE_GATE,
        }
    }
}

impl ScoringThresholds {
    pub fn with_coverage_min(mut self, value: f32) -> Self {
        self.coverage_min = value;
        self
    }

    pub fn with_confidence_min(mut self, value: f32) -> Self {
        self.confidence_min = value;
        self
    }

    pub fn with_violation_max(mut self, value: u32) -> Self {
        self.violation_max = value;
        self
    }

    pub fn with_generate_gate(mut self, value: f32) -> Self {
        self.generate_gate = value;
        self
    }
}

/// Outcome of one `validate` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub passed: bool,
    pub coverage: f32,
    pub confidence: f32,
    pub glossary_hit: f32,
    pub violation_weight: u32,
    /// Score before the violation penalty.
    pub score_raw: f32,
    pub score: f32,
    pub violations: Vec<Violation>,
    pub citations: Vec<Citation>,
    pub thresholds: ScoringThresholds,
    /// Content after auto-fix; identical to the input when nothing was rewritten.
    pub normalized_content: String,
}
