//! Engine facade: wires collaborators and configuration into the validator, generation
//! gate and pipeline, and exposes `validate`, `retrieve` and `run_pipeline`.

#[cfg(test)]
mod tests;

use std::sync::Arc;
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::embedding::Embedder;
use crate::generation::{
    GateConfig, GenerationArtifact, GenerationGate, Generator, OfflineGenerator, OutputFormat,
};
use crate::lint::{LintSchema, StructuralLint};
use crate::pipeline::{
    DocumentParser, HeuristicRouter, PipelineFsm, PipelineOutput, PipelineRequest, PlanRouter,
};
use crate::retrieval::{RankedHit, Retriever, RetrieverConfig};
use crate::scoring::{
    CoverageConfidenceScorer, ScoringThresholds, TermNormalizer, ValidationResult, Validator,
    ViolationConfig, ViolationEngine,
};
use crate::vectordb::VectorIndex;

/// Collects collaborators for an [`Engine`].
///
/// The embedder and vector index are required. Without a generator the gate runs against
/// [`OfflineGenerator`]; without a router the [`HeuristicRouter`] plans every run.
pub struct EngineBuilder {
    config: Config,
    embedder: Option<Arc<dyn Embedder>>,
    index: Option<Arc<dyn VectorIndex>>,
    generator: Option<Arc<dyn Generator>>,
    parser: Option<Arc<dyn DocumentParser>>,
    router: Option<Arc<dyn PlanRouter>>,
    violations: Option<ViolationConfig>,
    normalizer: Option<TermNormalizer>,
    lint_schema: Option<LintSchema>,
}

impl EngineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            embedder: None,
            index: None,
            generator: None,
            parser: None,
            router: None,
            violations: None,
            normalizer: None,
            lint_schema: None,
        }
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn parser(mut self, parser: Arc<dyn DocumentParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    pub fn router(mut self, router: Arc<dyn PlanRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Replaces the default detector set (ICH and MFDS tiers, terminology, red flags).
    pub fn violations(mut self, violations: ViolationConfig) -> Self {
        self.violations = Some(violations);
        self
    }

    /// Takes precedence over `normalization_path`.
    pub fn normalizer(mut self, normalizer: TermNormalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// Takes precedence over `rules_path`.
    pub fn lint_schema(mut self, schema: LintSchema) -> Self {
        self.lint_schema = Some(schema);
        self
    }

    pub fn build(self) -> Result<Engine, ConfigError> {
        self.config.validate()?;

        let embedder = self
            .embedder
            .ok_or(ConfigError::MissingCollaborator { name: "embedder" })?;
        let index = self
            .index
            .ok_or(ConfigError::MissingCollaborator { name: "vector index" })?;
        let config = self.config;

        let guidelines = Retriever::new(
            embedder.clone(),
            index.clone(),
            config.guide_collection.clone(),
            RetrieverConfig {
                lexical: config.lexical_enabled,
                ..RetrieverConfig::default()
            }
            .with_alpha(config.hybrid_alpha)
            .with_lambda(config.mmr_lambda),
        );
        let vector_only = RetrieverConfig::vector_only().with_lambda(config.mmr_lambda);
        let reference = Retriever::new(
            embedder.clone(),
            index.clone(),
            config.reference_collection.clone(),
            vector_only.clone(),
        );
        let glossary = Retriever::new(
            embedder,
            index,
            config.glossary_collection.clone(),
            vector_only,
        );

        let normalizer = match (self.normalizer, &config.normalization_path) {
            (Some(normalizer), _) => Some(normalizer),
            (None, Some(path)) => Some(TermNormalizer::from_path(path).map_err(|e| {
                ConfigError::InvalidRulesFile {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            })?),
            (None, None) => None,
        };

        let schema = match (self.lint_schema, &config.rules_path) {
            (Some(schema), _) => schema,
            (None, Some(path)) => {
                LintSchema::from_path(path).map_err(|e| ConfigError::InvalidRulesFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
            (None, None) => LintSchema::builtin(),
        };

        let thresholds = ScoringThresholds::default()
            .with_coverage_min(config.coverage_min)
            .with_confidence_min(config.confidence_min)
            .with_violation_max(config.violation_max)
            .with_generate_gate(config.generate_gate);

        let violations = ViolationEngine::new(self.violations.unwrap_or_default())
            .with_reference(reference);
        let mut validator = Validator::new(
            guidelines.clone(),
            violations,
            CoverageConfidenceScorer::new(thresholds),
        )
        .with_glossary(glossary);
        if let Some(normalizer) = normalizer {
            validator = validator.with_normalizer(normalizer);
        }

        let gate_config = GateConfig::default()
            .with_generate_gate(config.generate_gate)
            .with_generate_ready_min(config.generate_ready_min)
            .with_lint_max_major(config.lint_max_major);
        let generator = self
            .generator
            .unwrap_or_else(|| Arc::new(OfflineGenerator));
        let gate = GenerationGate::new(generator, gate_config)
            .with_references(guidelines.clone())
            .with_lint(StructuralLint::new(schema));

        let router = self.router.unwrap_or_else(|| Arc::new(HeuristicRouter));
        let mut fsm = PipelineFsm::new(router, validator.clone(), gate.clone());
        if let Some(parser) = self.parser {
            fsm = fsm.with_parser(parser);
        }

        info!(
            guide_collection = %config.guide_collection,
            reference_collection = %config.reference_collection,
            glossary_collection = %config.glossary_collection,
            lexical = config.lexical_enabled,
            "Engine assembled"
        );

        Ok(Engine {
            config,
            guidelines,
            validator,
            gate,
            fsm,
        })
    }
}

/// Entry point for validation, retrieval and pipeline runs. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Engine {
    config: Config,
    guidelines: Retriever,
    validator: Validator,
    gate: GenerationGate,
    fsm: PipelineFsm,
}

impl Engine {
    pub fn builder(config: Config) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `Validate(section, content, autoFix)`.
    pub async fn validate(&self, section: &str, content: &str, auto_fix: bool) -> ValidationResult {
        self.validator.validate(section, content, auto_fix).await
    }

    /// `Retrieve(query, module, k, useMMR)` over the guideline collection.
    pub async fn retrieve(
        &self,
        query: &str,
        module: Option<&str>,
        k: usize,
        use_mmr: bool,
    ) -> Vec<RankedHit> {
        self.guidelines.retrieve(query, module, k, use_mmr).await
    }

    /// Runs the generation gate directly, outside a pipeline.
    pub async fn generate(
        &self,
        section: &str,
        content: &str,
        format: OutputFormat,
        validation: Option<&ValidationResult>,
        csv_files: &[String],
    ) -> GenerationArtifact {
        self.gate
            .run(section, content, format, validation, csv_files)
            .await
    }

    /// `RunPipeline(desc, files, section, format)`.
    pub async fn run_pipeline(&self, request: &PipelineRequest) -> PipelineOutput {
        self.fsm.run(request).await
    }
}
