//! Rule-based terminology normalization used by auto-fix.

use regex::{NoExpand, Regex, RegexBuilder};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::error::ScoringError;

/// A canonical term and the spellings that should be rewritten to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRule {
    pub canonical: String,
    pub synonyms: Vec<String>,
}

impl TermRule {
    pub fn new<I, S>(canonical: impl Into<String>, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            canonical: canonical.into(),
            synonyms: synonyms.into_iter().map(Into::into).collect(),
        }
    }
}

/// Rewrites synonyms to their canonical form (whole word, case-insensitive).
#[derive(Debug, Clone, Default)]
pub struct TermNormalizer {
    patterns: Vec<(Regex, String)>,
}

impl TermNormalizer {
    pub fn new(rules: Vec<TermRule>) -> Result<Self, ScoringError> {
        let mut patterns = Vec::new();
        for rule in rules {
            let canonical = rule.canonical.trim();
            if canonical.is_empty() {
                continue;
            }
            for synonym in rule.synonyms.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
                let regex = RegexBuilder::new(&format!(r"\b{}\b", regex::escape(synonym)))
                    .case_insensitive(true)
                    .build()?;
                patterns.push((regex, canonical.to_string()));
            }
        }
        Ok(Self { patterns })
    }

    /// Builds rules from any of the accepted shapes:
    ///
    /// - `{terms: [{canonical, synonyms: [..]}]}`
    /// - `{mappings: {synonym: canonical}}`
    /// - `{canonical: [synonym, ..]}`
    pub fn from_value(value: &Value) -> Result<Self, ScoringError> {
        let Value::Object(map) = value else {
            return Err(ScoringError::InvalidRules {
                reason: "top level must be a mapping".to_string(),
            });
        };

        let rules = if let Some(Value::Array(terms)) = map.get("terms") {
            terms
                .iter()
                .filter_map(|t| {
                    let canonical = t.get("canonical").and_then(Value::as_str)?;
                    let synonyms = string_list(t.get("synonyms")?);
                    Some(TermRule::new(canonical, synonyms))
                })
                .collect()
        } else if let Some(Value::Object(mappings)) = map.get("mappings") {
            let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for (synonym, canonical) in mappings {
                if let Some(canonical) = canonical.as_str() {
                    grouped
                        .entry(canonical.to_string())
                        .or_default()
                        .push(synonym.clone());
                }
            }
            grouped
                .into_iter()
                .map(|(canonical, synonyms)| TermRule::new(canonical, synonyms))
                .collect()
        } else {
            map.iter()
                .filter(|(_, v)| v.is_array())
                .map(|(canonical, v)| TermRule::new(canonical.clone(), string_list(v)))
                .collect()
        };

        Self::new(rules)
    }

    /// Loads rules from a YAML (`.yaml`/`.yml`) or JSON file.
    pub fn from_path(path: &Path) -> Result<Self, ScoringError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScoringError::RulesIo {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let value: Value = if is_yaml {
            serde_yaml::from_str(&raw).map_err(|e| ScoringError::InvalidRules {
                reason: e.to_string(),
            })?
        } else {
            serde_json::from_str(&raw).map_err(|e| ScoringError::InvalidRules {
                reason: e.to_string(),
            })?
        };

        let normalizer = Self::from_value(&value)?;
        debug!(path = %path.display(), patterns = normalizer.len(), "Loaded term rules");
        Ok(normalizer)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn normalize(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (pattern, canonical) in &self.patterns {
            out = pattern
                .replace_all(&out, NoExpand(canonical.as_str()))
                .into_owned();
        }
        out
    }
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
