use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::GenerationError;
use crate::constants::{DEFAULT_GENERATE_GATE, DEFAULT_GENERATE_READY_MIN, DEFAULT_LINT_MAX_MAJOR};
use crate::lint::Finding;
use crate::retrieval::Citation;

/// Reason reported on artifacts the gate refused to generate.
pub const GATE_NOT_MET: &str = "gate_not_met";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Markdown,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(GenerationError::InvalidFormat {
                value: other.to_string(),
            }),
        }
    }
}

/// What the generation collaborator is asked to draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub section: String,
    /// Source content, already normalized when auto-fix ran.
    pub content: String,
    pub output_format: OutputFormat,
    /// Evidence the draft should cite as `[CIT-n]`, 1-based in this order.
    pub references: Vec<Citation>,
}

/// Gate and readiness thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateConfig {
    pub generate_gate: f32,
    pub generate_ready_min: f32,
    pub lint_max_major: usize,
    /// Upper bound on references handed to the generator.
    pub max_refs: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            generate_gate: DEFAULT_GENERATE_GATE,
            generate_ready_min: DEFAULT_GENERATE_READY_MIN,
            lint_max_major: DEFAULT_LINT_MAX_MAJOR,
            max_refs: 6,
        }
    }
}

impl GateConfig {
    pub fn with_generate_gate(mut self, value: f32) -> Self {
        self.generate_gate = value;
        self
    }

    pub fn with_generate_ready_min(mut self, value: f32) -> Self {
        self.generate_ready_min = value;
        self
    }

    pub fn with_lint_max_major(mut self, value: usize) -> Self {
        self.lint_max_major = value;
        self
    }

    pub fn with_max_refs(mut self, value: usize) -> Self {
        self.max_refs = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenMetrics {
    pub cit_density: f32,
    pub lint_major: usize,
    pub gen_score: f32,
    pub thresholds: GateConfig,
}

/// Result of one pass through the generation gate, generated or skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationArtifact {
    pub section: String,
    pub format: OutputFormat,
    pub text: String,
    pub rag_used: bool,
    pub rag_refs: Vec<Citation>,
    pub lint_ok: bool,
    pub lint_findings: Vec<Finding>,
    pub gen_metrics: GenMetrics,
    pub ready: bool,
    /// Error from the generator when the text is the offline skeleton.
    pub offline_fallback: Option<String>,
    pub skipped: bool,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GenerationArtifact {
    /// Artifact for a refused gate: empty text, no references, not ready.
    pub fn skipped(section: impl Into<String>, format: OutputFormat, config: GateConfig) -> Self {
        Self {
            section: section.into(),
            format,
            text: String::new(),
            rag_used: false,
            rag_refs: Vec::new(),
            lint_ok: false,
            lint_findings: Vec::new(),
            gen_metrics: GenMetrics {
                cit_density: 0.0,
                lint_major: 0,
                gen_score: 0.0,
                thresholds: config,
            },
            ready: false,
            offline_fallback: None,
            skipped: true,
            reason: Some(GATE_NOT_MET.to_string()),
            created_at: Utc::now(),
        }
    }
}
