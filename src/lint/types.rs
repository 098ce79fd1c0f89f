use serde::{Deserialize, Serialize};

use crate::scoring::Severity;

/// Key used for findings about the document as a whole (parse errors, bad top level).
pub const DOCUMENT_KEY: &str = "__yaml__";
/// Key used for red-flag findings over the whole text.
pub const TEXT_KEY: &str = "__text__";

/// One structural problem in a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    /// Dotted path of the offending field (`References[0].page`).
    pub key: String,
    pub reason: String,
    pub fix_hint: String,
    pub severity: Severity,
}

impl Finding {
    pub fn new(
        key: impl Into<String>,
        reason: impl Into<String>,
        fix_hint: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
            fix_hint: fix_hint.into(),
            severity,
        }
    }
}

/// All findings for one document. `ok` iff there are none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LintReport {
    pub ok: bool,
    pub findings: Vec<Finding>,
}

impl LintReport {
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        Self {
            ok: findings.is_empty(),
            findings,
        }
    }

    /// A clean report for documents that are not linted.
    pub fn clean() -> Self {
        Self::from_findings(Vec::new())
    }

    /// Findings at `major` severity or above.
    pub fn major_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity >= Severity::Major)
            .count()
    }
}
