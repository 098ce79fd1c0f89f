use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up scoring components.
///
/// Validation itself never fails: external lookups degrade to zero scores.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("failed to read normalization rules from {path}: {source}")]
    RulesIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed normalization rules: {reason}")]
    InvalidRules { reason: String },

    #[error("invalid severity '{value}'")]
    InvalidSeverity { value: String },

    #[error("invalid term pattern: {0}")]
    Pattern(#[from] regex::Error),
}
