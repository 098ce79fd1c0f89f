use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

use super::types::RankedHit;
use crate::constants::{CITATION_SNIPPET_CHARS, truncate_chars};

/// Evidence reference attached to validation results and generated drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub doc: String,
    pub section: Option<String>,
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub para_id: Option<String>,
    /// At most 300 characters; clipped text ends in `...`.
    pub snippet: String,
    pub score: f32,
}

impl Citation {
    pub fn from_hit(hit: &RankedHit) -> Self {
        let md = &hit.candidate.metadata;
        Self {
            doc: md.doc_label().unwrap_or(hit.id()).to_string(),
            section: md.section.clone().or_else(|| md.module.clone()),
            page: md.page,
            para_id: md.para_id.clone(),
            snippet: clip_snippet(hit.content()),
            score: hit.fused_score,
        }
    }
}

fn clip_snippet(text: &str) -> String {
    if truncate_chars(text, CITATION_SNIPPET_CHARS).len() == text.len() {
        return text.to_string();
    }
    format!("{}...", truncate_chars(text, CITATION_SNIPPET_CHARS - 3))
}

/// Builds citations best-score first, keeping one per `(doc, page)`.
pub fn build_citations(hits: &[RankedHit], limit: Option<usize>) -> Vec<Citation> {
    let mut ordered: Vec<&RankedHit> = hits.iter().collect();
    ordered.sort_by(|a, b| {
        b.fused_score
            .partial_cmp(&a.fused_score)
            .unwrap_or(Ordering::Equal)
    });

    let mut seen: HashSet<(String, Option<i64>)> = HashSet::new();
    let mut citations = Vec::new();
    for hit in ordered {
        let citation = Citation::from_hit(hit);
        if !seen.insert((citation.doc.clone(), citation.page)) {
            continue;
        }
        citations.push(citation);
        if limit.is_some_and(|l| citations.len() >= l) {
            break;
        }
    }
    citations
}
