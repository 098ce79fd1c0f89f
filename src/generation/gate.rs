use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::density::citation_density;
use super::generator::Generator;
use super::types::{GateConfig, GenMetrics, GenerationArtifact, GenerationRequest, OutputFormat};
use crate::constants::{DEFAULT_MMR_LAMBDA, GUIDELINE_QUERY_CHARS, truncate_chars};
use crate::lint::{LintReport, StructuralLint, unwrap_yaml_fence};
use crate::retrieval::{RankedHit, RetrieveOptions, Retriever, build_citations};
use crate::scoring::ValidationResult;
use crate::section::normalize_section;

const REFERENCE_FETCH_K: usize = 12;

/// True when generation may run: no validation was performed, or it passed with
/// `score >= generate_gate`.
pub fn ok_for_generation(validation: Option<&ValidationResult>, generate_gate: f32) -> bool {
    validation.is_none_or(|v| v.passed && v.score >= generate_gate)
}

/// Skeleton emitted when the generator is unavailable.
pub fn offline_skeleton(section: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Yaml => "```yaml\nNEED_INPUT: true\nReferences: []\n```".to_string(),
        OutputFormat::Markdown => {
            format!("### {section} Draft\n\n- NEED_INPUT\n\n## References\n- (none)")
        }
    }
}

/// Decides whether to draft a section and scores what comes back.
#[derive(Clone)]
pub struct GenerationGate {
    generator: Arc<dyn Generator>,
    references: Option<Retriever>,
    lint: StructuralLint,
    config: GateConfig,
}

impl std::fmt::Debug for GenerationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationGate")
            .field("model", &self.generator.model_name())
            .field("references", &self.references)
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationGate {
    pub fn new(generator: Arc<dyn Generator>, config: GateConfig) -> Self {
        Self {
            generator,
            references: None,
            lint: StructuralLint::default(),
            config,
        }
    }

    pub fn with_references(mut self, references: Retriever) -> Self {
        self.references = Some(references);
        self
    }

    pub fn with_lint(mut self, lint: StructuralLint) -> Self {
        self.lint = lint;
        self
    }

    pub fn config(&self) -> GateConfig {
        self.config
    }

    pub fn is_open(&self, validation: Option<&ValidationResult>) -> bool {
        ok_for_generation(validation, self.config.generate_gate)
    }

    /// Gathers references, drafts, lints and scores one section.
    ///
    /// A closed gate returns a skipped artifact without calling the generator. A failed
    /// generator call yields the offline skeleton with `offline_fallback` set.
    #[instrument(skip(self, content, validation, csv_files), fields(format = %format))]
    pub async fn run(
        &self,
        section: &str,
        content: &str,
        format: OutputFormat,
        validation: Option<&ValidationResult>,
        csv_files: &[String],
    ) -> GenerationArtifact {
        let section = normalize_section(section);

        if !self.is_open(validation) {
            info!(
                section = %section,
                score = validation.map(|v| v.score),
                gate = self.config.generate_gate,
                "Generation gate not met, skipping"
            );
            return GenerationArtifact::skipped(section, format, self.config);
        }

        let content = validation
            .map(|v| v.normalized_content.as_str())
            .unwrap_or(content);

        let hits = self.gather_references(&section, content).await;
        let references = build_citations(&hits, Some(self.config.max_refs));
        let request = GenerationRequest {
            section: section.clone(),
            content: content.to_string(),
            output_format: format,
            references,
        };

        let (text, offline_fallback) = match self.generator.generate(&request).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!(error = %e, "Generation failed, emitting offline skeleton");
                (offline_skeleton(&section, format), Some(e.to_string()))
            }
        };

        let (report, density) = match format {
            OutputFormat::Yaml => (
                self.lint.lint(&text, &section, csv_files),
                citation_density(unwrap_yaml_fence(&text)),
            ),
            OutputFormat::Markdown => (LintReport::clean(), citation_density(&text)),
        };

        let lint_major = report.major_count();
        let within_major = lint_major <= self.config.lint_max_major;
        let lint_bonus = if report.ok && within_major { 1.0 } else { 0.0 };
        let gen_score = 0.6 * density + 0.4 * lint_bonus;
        let ready = gen_score >= self.config.generate_ready_min && within_major;

        info!(
            section = %section,
            gen_score,
            lint_major,
            ready,
            offline = offline_fallback.is_some(),
            "Generation complete"
        );

        GenerationArtifact {
            section,
            format,
            text,
            rag_used: !hits.is_empty(),
            rag_refs: request.references,
            lint_ok: report.ok,
            lint_findings: report.findings,
            gen_metrics: GenMetrics {
                cit_density: density,
                lint_major,
                gen_score,
                thresholds: self.config,
            },
            ready,
            offline_fallback,
            skipped: false,
            reason: None,
            created_at: Utc::now(),
        }
    }

    /// Section-filtered hits first, topped up with unfiltered MMR hits, one per
    /// `(doc, page)`, at most `max_refs`.
    async fn gather_references(&self, section: &str, content: &str) -> Vec<RankedHit> {
        let Some(references) = &self.references else {
            return Vec::new();
        };
        let max_refs = self.config.max_refs;
        if max_refs == 0 {
            return Vec::new();
        }
        let query = truncate_chars(content, GUIDELINE_QUERY_CHARS);

        let primary = references
            .retrieve(query, Some(section), (max_refs / 2).max(3), false)
            .await;
        let options = RetrieveOptions::top_k(max_refs.saturating_sub(primary.len()).max(3))
            .with_fetch_k(REFERENCE_FETCH_K)
            .with_mmr(true)
            .with_lambda(DEFAULT_MMR_LAMBDA);
        let diverse = references.search(query, &options).await;

        let mut seen = HashSet::new();
        let merged: Vec<RankedHit> = primary
            .into_iter()
            .chain(diverse)
            .filter(|hit| {
                let doc = hit
                    .candidate
                    .metadata
                    .doc_label()
                    .unwrap_or(hit.id())
                    .to_string();
                seen.insert((doc, hit.candidate.metadata.page))
            })
            .take(max_refs)
            .collect();
        debug!(references = merged.len(), "Gathered generation references");
        merged
    }
}
