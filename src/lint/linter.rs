use regex::Regex;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use super::schema::{FieldRule, LintSchema, MinLength, SectionSchema};
use super::types::{DOCUMENT_KEY, Finding, LintReport, TEXT_KEY};
use crate::scoring::Severity;

static M26_CSV: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^m26_\d+_.*\.csv$").expect("static pattern is valid"));

/// True when any file name looks like an M2.6 companion table (`m26_<n>_*.csv`).
pub fn has_m26_csv<S: AsRef<str>>(files: &[S]) -> bool {
    files.iter().any(|f| {
        let name = Path::new(f.as_ref())
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        M26_CSV.is_match(name)
    })
}

/// Strips a surrounding ```` ```yaml ```` (or bare ```` ``` ````) fence, if any.
pub fn unwrap_yaml_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => "",
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Checks generated YAML documents against a [`LintSchema`].
#[derive(Debug, Clone)]
pub struct StructuralLint {
    schema: Arc<LintSchema>,
}

impl Default for StructuralLint {
    fn default() -> Self {
        Self::new(LintSchema::builtin())
    }
}

impl StructuralLint {
    pub fn new(schema: LintSchema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &LintSchema {
        &self.schema
    }

    /// Parses `text` as YAML and lints it. A parse failure or non-mapping top level
    /// is a single critical finding.
    pub fn lint(&self, text: &str, section: &str, csv_files: &[String]) -> LintReport {
        let body = unwrap_yaml_fence(text);
        let data: Value = match serde_yaml::from_str(body) {
            Ok(data) => data,
            Err(e) => {
                return LintReport::from_findings(vec![Finding::new(
                    DOCUMENT_KEY,
                    format!("parse_error: {e}"),
                    "fix yaml syntax",
                    Severity::Critical,
                )]);
            }
        };
        self.lint_value(&data, section, csv_files)
    }

    pub fn lint_value(&self, data: &Value, section: &str, csv_files: &[String]) -> LintReport {
        let Value::Object(map) = data else {
            return LintReport::from_findings(vec![Finding::new(
                DOCUMENT_KEY,
                "top-level must be a mapping",
                "make top-level a mapping",
                Severity::Critical,
            )]);
        };

        let mut findings = Vec::new();
        self.check_red_flags(data, &mut findings);

        if let Some(schema) = self.schema.section(section) {
            for required in schema.required_keys(has_m26_csv(csv_files)) {
                if map.get(&required.key).is_none_or(is_blank) {
                    findings.push(Finding::new(
                        required.key.clone(),
                        format!("missing_required({})", required.severity),
                        "supply value",
                        required.severity,
                    ));
                }
            }
            check_fields(schema, map, &mut findings);
        }

        debug!(section, findings = findings.len(), "Linted document");
        LintReport::from_findings(findings)
    }

    fn check_red_flags(&self, data: &Value, findings: &mut Vec<Finding>) {
        let text = serde_yaml::to_string(data).unwrap_or_default().to_lowercase();
        let hits: Vec<&str> = self
            .schema
            .red_flags
            .iter()
            .map(String::as_str)
            .filter(|p| !p.is_empty() && text.contains(&p.to_lowercase()))
            .collect();
        if !hits.is_empty() {
            findings.push(Finding::new(
                TEXT_KEY,
                format!("red_flags: {}", hits.join(", ")),
                "remove placeholders/vague terms",
                Severity::Major,
            ));
        }
    }
}

fn check_fields(
    schema: &SectionSchema,
    map: &serde_json::Map<String, Value>,
    findings: &mut Vec<Finding>,
) {
    for check in &schema.fields {
        let Some(value) = map.get(&check.key) else {
            continue;
        };
        let key = check.key.as_str();
        match &check.rule {
            FieldRule::Pattern(regex) => {
                if let Value::String(s) = value
                    && !regex.is_match(s)
                {
                    findings.push(Finding::new(
                        key,
                        "pattern_mismatch",
                        format!("follow {key} pattern"),
                        Severity::Major,
                    ));
                }
            }
            FieldRule::AllowedValues(allowed) => {
                if let Value::String(s) = value
                    && !allowed.is_empty()
                    && !allowed.iter().any(|a| a == s)
                {
                    let mut sorted = allowed.clone();
                    sorted.sort();
                    findings.push(Finding::new(
                        key,
                        format!("not_in_allowed_values: {s}"),
                        format!("use one of: {}", sorted.join(", ")),
                        Severity::Major,
                    ));
                }
            }
            FieldRule::ListOfObjects(required) => {
                check_list_of_objects(key, value, required, findings)
            }
            FieldRule::MinLength(min) => check_min_length(key, value, min, findings),
            FieldRule::NonEmptyList => match value {
                Value::Array(items) if items.is_empty() => findings.push(Finding::new(
                    key,
                    "empty_list",
                    "render at least one table",
                    Severity::Major,
                )),
                Value::Array(_) => {}
                _ => findings.push(Finding::new(
                    key,
                    "type_mismatch(list expected)",
                    "use a list",
                    Severity::Major,
                )),
            },
        }
    }
}

fn check_list_of_objects(
    key: &str,
    value: &Value,
    required: &[String],
    findings: &mut Vec<Finding>,
) {
    let Value::Array(items) = value else {
        findings.push(Finding::new(
            key,
            "type_mismatch(list expected)",
            format!("list of {{{}}}", required.join(",")),
            Severity::Major,
        ));
        return;
    };

    for (i, item) in items.iter().enumerate() {
        let Value::Object(obj) = item else {
            findings.push(Finding::new(
                format!("{key}[{i}]"),
                "type_mismatch(object expected)",
                "use mapping",
                Severity::Major,
            ));
            continue;
        };
        for rk in required.iter().filter(|rk| !obj.contains_key(rk.as_str())) {
            findings.push(Finding::new(
                format!("{key}[{i}].{rk}"),
                "missing",
                "add field",
                Severity::Major,
            ));
        }
    }
}

fn check_min_length(key: &str, value: &Value, min: &MinLength, findings: &mut Vec<Finding>) {
    match value {
        Value::String(s) => {
            if let Some(n) = min.text
                && s.chars().count() < n
            {
                findings.push(Finding::new(
                    key,
                    format!("too_short(<{n})"),
                    "expand narrative",
                    Severity::Minor,
                ));
            }
        }
        Value::Object(blocks) => {
            for (block, n) in &min.blocks {
                if let Some(Value::String(s)) = blocks.get(block)
                    && s.chars().count() < *n
                {
                    findings.push(Finding::new(
                        format!("{key}.{block}"),
                        format!("too_short(<{n})"),
                        "add details",
                        Severity::Minor,
                    ));
                }
            }
        }
        _ => findings.push(Finding::new(
            key,
            "type_mismatch(string or mapping expected)",
            "use string or {Block: text}",
            Severity::Major,
        )),
    }
}
