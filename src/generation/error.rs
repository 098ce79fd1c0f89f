use thiserror::Error;

/// Failure of the external generation collaborator.
///
/// The gate never propagates it: a failed call becomes an offline-fallback artifact.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("generation returned no text")]
    EmptyResponse,

    #[error("invalid output format '{value}' (expected yaml or markdown)")]
    InvalidFormat { value: String },
}

impl From<genai::Error> for GenerationError {
    fn from(err: genai::Error) -> Self {
        GenerationError::RequestFailed {
            reason: err.to_string(),
        }
    }
}
