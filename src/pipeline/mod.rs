//! Run orchestration: route a request, parse its files, validate, gate generation.
//!
//! [`PipelineFsm::run`] always returns a [`PipelineOutput`] with the trace collected so
//! far. Collaborator failures degrade inside each step; a step that errors or panics
//! ends the run in `ERROR`.

pub mod error;
pub mod fsm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parse;
pub mod plan;
pub mod router;
pub mod trace;

#[cfg(test)]
mod tests;

pub use error::{ParseError, PipelineError, RoutingError};
pub use fsm::{PipelineFsm, PipelineOutput, PipelineRequest};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockDocumentParser;
pub use parse::{DocumentParser, ParseFailure, ParseOutput, ParsedDocument};
pub use plan::{Action, GatePlan, GatePlanBuilder, PlanOverrides};
pub use router::{HeuristicRouter, PlanRouter, route_with_fallback};
pub use trace::{PipelineState, PipelineTrace, TraceEntry};
