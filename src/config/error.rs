//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading, validation and engine assembly.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}' as a number")]
    InvalidNumber { name: &'static str, value: String },

    /// A boolean environment variable was not one of the accepted spellings.
    #[error("failed to parse {name}='{value}' as a boolean")]
    InvalidBool { name: &'static str, value: String },

    /// A ratio or threshold fell outside `[0, 1]`.
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f32 },

    /// A count that must be positive was zero.
    #[error("{name} must be greater than zero")]
    ZeroValue { name: &'static str },

    /// A collection name was empty.
    #[error("collection name for {name} must not be empty")]
    EmptyCollection { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// A lint checklist or normalization rules file could not be loaded.
    #[error("failed to load {path}: {reason}")]
    InvalidRulesFile { path: PathBuf, reason: String },

    /// A required collaborator (embedder, vector index) was not supplied.
    #[error("missing required collaborator: {name}")]
    MissingCollaborator { name: &'static str },
}
