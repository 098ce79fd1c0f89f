use thiserror::Error;

use super::trace::PipelineState;

/// Failure of the plan router. Callers recover through
/// [`route_with_fallback`](super::route_with_fallback).
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("router unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("router returned an unusable plan: {reason}")]
    InvalidPlan { reason: String },
}

/// Whole-batch failure of the document parser.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("document parsing failed: {reason}")]
    Failed { reason: String },
}

/// A step failure that ends a pipeline run in `ERROR`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("step {state} needs a {name} but none is configured")]
    MissingCollaborator {
        state: PipelineState,
        name: &'static str,
    },

    #[error("step {state} reached before a plan was resolved")]
    MissingPlan { state: PipelineState },

    #[error("step {state} panicked: {message}")]
    Panicked {
        state: PipelineState,
        message: String,
    },
}
