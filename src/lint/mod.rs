//! Structural lint for generated YAML drafts.
//!
//! [`StructuralLint`] checks required keys, field patterns and enumerations, nested
//! list-of-object shapes and narrative lengths against a per-section [`LintSchema`].
//! Findings carry a [`Severity`](crate::scoring::Severity); the generation gate counts
//! those at `major` or above.

pub mod error;
pub mod linter;
pub mod schema;
pub mod types;


pub use error::LintError;
pub use linter::{StructuralLint, has_m26_csv, unwrap_yaml_fence};
pub use schema::{
    CsvPolicy, DOSAGE_FORMS, FieldCheck, FieldRule, LintSchema, MinLength, RequiredKey,
    SectionSchema,
};
pub use types::{DOCUMENT_KEY, Finding, LintReport, TEXT_KEY};
