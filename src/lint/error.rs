use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a lint checklist.
///
/// Linting a document never fails; problems with the document become findings.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("failed to read checklist {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid checklist: {reason}")]
    InvalidSchema { reason: String },

    #[error("invalid pattern for field {key}: {source}")]
    Pattern {
        key: String,
        #[source]
        source: regex::Error,
    },
}
