//! Gated section drafting.
//!
//! [`GenerationGate`] only calls the [`Generator`] when validation passed with a score at
//! or above `generate_gate` (or was not run). Drafts are linted, scored by citation density
//! and lint cleanliness, and marked `ready` when they clear `generate_ready_min`.

pub mod density;
pub mod error;
pub mod gate;
pub mod generator;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

#[cfg(test)]
mod tests;

pub use density::{citation_density, count_citation_markers};
pub use error::GenerationError;
pub use gate::{GenerationGate, offline_skeleton, ok_for_generation};
pub use generator::{
    GenaiGenerator, Generator, OfflineGenerator, build_messages, render_context,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockGenerator;
pub use types::{
    GATE_NOT_MET, GateConfig, GenMetrics, GenerationArtifact, GenerationRequest, OutputFormat,
};
