//! Sentinel library crate (used by the `sentinel` binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`Engine`], [`EngineBuilder`] - Collaborator wiring and the three entry points
//!   (`validate`, `retrieve`, `run_pipeline`)
//! - [`Config`], [`ConfigError`] - Environment configuration
//!
//! ## Retrieval & Scoring
//! - [`Retriever`], [`RankedHit`], [`Citation`] - Hybrid BM25/vector ranking with MMR
//! - [`Validator`], [`ValidationResult`], [`Violation`] - Compliance scoring
//!
//! ## Generation & Pipeline
//! - [`GenerationGate`], [`GenerationArtifact`] - Gated drafting
//! - [`StructuralLint`], [`LintReport`] - Checklist lint for YAML drafts
//! - [`PipelineFsm`], [`PipelineOutput`], [`GatePlan`] - Audited orchestration
//!
//! ## Collaborator Seams
//! - [`Embedder`], [`VectorIndex`], [`Generator`], [`DocumentParser`], [`PlanRouter`]
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod engine;
pub mod generation;
pub mod hashing;
pub mod lint;
pub mod pipeline;
pub mod retrieval;
pub mod scoring;
pub mod section;
pub mod vectordb;

pub use config::{Config, ConfigError};
pub use embedding::{CachedEmbedder, Embedder, EmbeddingError, HttpEmbedder, StubEmbedder};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use engine::{Engine, EngineBuilder};
pub use generation::{
    GateConfig, GenaiGenerator, GenerationArtifact, GenerationError, GenerationGate, Generator,
    OfflineGenerator, OutputFormat,
};
#[cfg(any(test, feature = "mock"))]
pub use generation::MockGenerator;
pub use lint::{Finding, LintError, LintReport, LintSchema, StructuralLint};
pub use pipeline::{
    Action, DocumentParser, GatePlan, HeuristicRouter, ParseError, ParseOutput, PipelineError,
    PipelineFsm, PipelineOutput, PipelineRequest, PipelineState, PipelineTrace, PlanOverrides,
    PlanRouter, RoutingError, TraceEntry,
};
#[cfg(any(test, feature = "mock"))]
pub use pipeline::MockDocumentParser;
pub use retrieval::{Citation, RankedHit, RetrieveOptions, Retriever, RetrieverConfig};
pub use scoring::{
    ScoringError, ScoringThresholds, Severity, TermNormalizer, ValidationResult, Validator,
    Violation, ViolationConfig, ViolationEngine,
};
pub use section::{DEFAULT_SECTION, normalize_section};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::{MockPoint, MockVectorIndex};
pub use vectordb::{Candidate, CandidateMetadata, QdrantIndex, SearchFilter, VectorDbError, VectorIndex};
