//! Section checklists: required keys, per-field rules and the M2.6 table policy.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use super::error::LintError;
use crate::scoring::{DEFAULT_RED_FLAGS, Severity};
use crate::section::normalize_section;

/// Narrative length constraint: a minimum for plain text, per-block minimums for mappings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinLength {
    pub text: Option<usize>,
    pub blocks: Vec<(String, usize)>,
}

/// A constraint on one field's value. Absent fields are the `required` list's concern.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// String values must fully match.
    Pattern(Regex),
    /// String values must be one of these.
    AllowedValues(Vec<String>),
    /// A list of mappings, each carrying these keys.
    ListOfObjects(Vec<String>),
    MinLength(MinLength),
    NonEmptyList,
}

#[derive(Debug, Clone)]
pub struct FieldCheck {
    pub key: String,
    pub rule: FieldRule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredKey {
    pub key: String,
    pub severity: Severity,
}

/// M2.6 policy tying required summaries to companion CSV tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvPolicy {
    /// `TabulatedSummaries` is required when an `m26_<n>_*.csv` file is present.
    pub require_tabulated_if_csv: bool,
    /// `WrittenSummary` is required when no such file is present.
    pub require_written_if_no_csv: bool,
}

impl Default for CsvPolicy {
    fn default() -> Self {
        Self {
            require_tabulated_if_csv: true,
            require_written_if_no_csv: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionSchema {
    pub required: Vec<RequiredKey>,
    pub fields: Vec<FieldCheck>,
    pub csv_policy: Option<CsvPolicy>,
    /// Severity for keys added by the CSV policy.
    pub policy_severity: BTreeMap<String, Severity>,
}

impl SectionSchema {
    pub fn require(mut self, key: impl Into<String>, severity: Severity) -> Self {
        self.required.push(RequiredKey {
            key: key.into(),
            severity,
        });
        self
    }

    pub fn field(mut self, key: impl Into<String>, rule: FieldRule) -> Self {
        self.fields.push(FieldCheck {
            key: key.into(),
            rule,
        });
        self
    }

    pub fn with_csv_policy(mut self, policy: CsvPolicy) -> Self {
        self.csv_policy = Some(policy);
        self
    }

    /// Required keys for a document, after applying the CSV policy.
    pub fn required_keys(&self, has_csv: bool) -> Vec<RequiredKey> {
        let mut keys = self.required.clone();
        let Some(policy) = self.csv_policy else {
            return keys;
        };

        let extra = match (has_csv, policy) {
            (true, p) if p.require_tabulated_if_csv => Some("TabulatedSummaries"),
            (false, p) if p.require_written_if_no_csv => Some("WrittenSummary"),
            _ => None,
        };
        if let Some(key) = extra
            && !keys.iter().any(|k| k.key == key)
        {
            keys.push(RequiredKey {
                key: key.to_string(),
                severity: self
                    .policy_severity
                    .get(key)
                    .copied()
                    .unwrap_or(Severity::Major),
            });
        }
        keys
    }
}

/// Checklist for every section plus global red-flag phrases.
#[derive(Debug, Clone, Default)]
pub struct LintSchema {
    pub red_flags: Vec<String>,
    pub sections: BTreeMap<String, SectionSchema>,
}

static PRODUCT_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[^\s].{1,119})$").expect("static pattern is valid"));

/// Dosage forms accepted by the built-in M2.3 checklist.
pub const DOSAGE_FORMS: [&str; 18] = [
    "tablet",
    "film-coated tablet",
    "capsule",
    "hard capsule",
    "soft capsule",
    "injection",
    "solution",
    "suspension",
    "powder",
    "granules",
    "cream",
    "ointment",
    "정제",
    "필름코팅정",
    "경질캡슐",
    "연질캡슐",
    "주사제",
    "산제",
];

impl LintSchema {
    /// Built-in checklists for `M2.3` (quality overall summary) and `M2.6` (nonclinical).
    pub fn builtin() -> Self {
        let m23 = SectionSchema::default()
            .require("ProductName", Severity::Critical)
            .require("DosageForm", Severity::Major)
            .require("DrugSubstance", Severity::Major)
            .require("DrugProduct", Severity::Major)
            .require("References", Severity::Major)
            .field("ProductName", FieldRule::Pattern(PRODUCT_NAME_PATTERN.clone()))
            .field(
                "DosageForm",
                FieldRule::AllowedValues(DOSAGE_FORMS.iter().map(|s| s.to_string()).collect()),
            )
            .field(
                "References",
                FieldRule::ListOfObjects(
                    ["doc", "section", "page", "para_id"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                ),
            );

        let m26 = SectionSchema::default()
            .require("Overview", Severity::Minor)
            .with_csv_policy(CsvPolicy::default())
            .field(
                "WrittenSummary",
                FieldRule::MinLength(MinLength {
                    text: Some(100),
                    blocks: vec![
                        ("Pharmacology".to_string(), 200),
                        ("Pharmacokinetics".to_string(), 200),
                        ("Toxicology".to_string(), 200),
                    ],
                }),
            )
            .field("TabulatedSummaries", FieldRule::NonEmptyList);

        Self {
            red_flags: DEFAULT_RED_FLAGS.iter().map(|s| s.to_string()).collect(),
            sections: BTreeMap::from([("M2.3".to_string(), m23), ("M2.6".to_string(), m26)]),
        }
    }

    /// Schema for `section`: an exact match, else `M2.6*` maps to `M2.6` and
    /// everything else to `M2.3`.
    pub fn section(&self, section: &str) -> Option<&SectionSchema> {
        let code = normalize_section(section);
        self.sections.get(&code).or_else(|| {
            let fallback = if code.starts_with("M2.6") { "M2.6" } else { "M2.3" };
            self.sections.get(fallback)
        })
    }

    /// Parses a checklist document (see [`LintSchema::from_path`]).
    pub fn from_value(value: Value) -> Result<Self, LintError> {
        let file: ChecklistFile =
            serde_json::from_value(value).map_err(|e| LintError::InvalidSchema {
                reason: e.to_string(),
            })?;
        file.into_schema()
    }

    /// Loads a YAML or JSON checklist.
    ///
    /// ```yaml
    /// global_red_flags: { phrases: [tbd, lorem ipsum] }
    /// value_sets: { dosage_forms: [tablet, capsule] }
    /// sections:
    ///   M2.3:
    ///     required: [ProductName, DosageForm]
    ///     severities: { ProductName: critical }
    ///     fields:
    ///       ProductName: { pattern: "[A-Z].+" }
    ///       DosageForm: { allowed_values_ref: value_sets.dosage_forms }
    ///       References: { list_of_objects: [doc, page] }
    ///   M2.6:
    ///     policy: { require_tabulated_if_csv: true, require_written_if_no_csv: true }
    ///     fields:
    ///       WrittenSummary: { min_length: { Toxicology: 200 } }
    ///       TabulatedSummaries: { non_empty_list: true }
    /// ```
    pub fn from_path(path: &Path) -> Result<Self, LintError> {
        let raw = std::fs::read_to_string(path).map_err(|source| LintError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_yaml::from_str(&raw).map_err(|e| LintError::InvalidSchema {
            reason: e.to_string(),
        })?;
        Self::from_value(value)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ChecklistFile {
    #[serde(default)]
    global_red_flags: Option<RedFlagsFile>,
    #[serde(default)]
    value_sets: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    sections: BTreeMap<String, SectionFile>,
    #[serde(default)]
    m2_3_qos: Option<SectionFile>,
    #[serde(default)]
    m2_6: Option<SectionFile>,
}

#[derive(Debug, Default, Deserialize)]
struct RedFlagsFile {
    #[serde(default)]
    phrases: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SectionFile {
    #[serde(default, alias = "required_keys_base")]
    required: Vec<String>,
    #[serde(default)]
    severities: BTreeMap<String, String>,
    #[serde(default)]
    fields: BTreeMap<String, FieldFile>,
    #[serde(default)]
    policy: Option<PolicyFile>,
}

#[derive(Debug, Default, Deserialize)]
struct FieldFile {
    pattern: Option<String>,
    allowed_values: Option<Vec<String>>,
    allowed_values_ref: Option<String>,
    list_of_objects: Option<Vec<String>>,
    min_length: Option<MinLengthFile>,
    #[serde(default)]
    non_empty_list: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MinLengthFile {
    Text(usize),
    Blocks(BTreeMap<String, usize>),
}

fn yes() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct PolicyFile {
    #[serde(default = "yes")]
    require_tabulated_if_csv: bool,
    #[serde(default = "yes")]
    require_written_if_no_csv: bool,
}

fn parse_severity(key: &str, raw: &str) -> Result<Severity, LintError> {
    raw.parse().map_err(|_| LintError::InvalidSchema {
        reason: format!("unknown severity '{raw}' for {key}"),
    })
}

impl ChecklistFile {
    fn into_schema(self) -> Result<LintSchema, LintError> {
        let mut raw_sections = self.sections;
        if let Some(m23) = self.m2_3_qos {
            raw_sections.entry("M2.3".to_string()).or_insert(m23);
        }
        if let Some(m26) = self.m2_6 {
            raw_sections.entry("M2.6".to_string()).or_insert(m26);
        }

        let mut sections = BTreeMap::new();
        for (name, raw) in raw_sections {
            let schema = raw.into_schema(&self.value_sets)?;
            sections.insert(normalize_section(&name), schema);
        }

        Ok(LintSchema {
            red_flags: self.global_red_flags.map(|r| r.phrases).unwrap_or_default(),
            sections,
        })
    }
}

impl SectionFile {
    fn into_schema(
        self,
        value_sets: &BTreeMap<String, Vec<String>>,
    ) -> Result<SectionSchema, LintError> {
        let mut severities = BTreeMap::new();
        for (key, raw) in &self.severities {
            severities.insert(key.clone(), parse_severity(key, raw)?);
        }

        let mut schema = SectionSchema::default();
        for key in self.required {
            let severity = severities.get(&key).copied().unwrap_or(Severity::Minor);
            schema = schema.require(key, severity);
        }

        for (key, field) in self.fields {
            if let Some(pattern) = field.pattern {
                let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
                    LintError::Pattern {
                        key: key.clone(),
                        source,
                    }
                })?;
                schema = schema.field(key.clone(), FieldRule::Pattern(regex));
            }

            let allowed = match (field.allowed_values, field.allowed_values_ref) {
                (Some(values), _) => Some(values),
                (None, Some(reference)) => {
                    let name = reference.trim_start_matches("value_sets.");
                    let values =
                        value_sets
                            .get(name)
                            .cloned()
                            .ok_or_else(|| LintError::InvalidSchema {
                                reason: format!("unknown value set '{name}' for {key}"),
                            })?;
                    Some(values)
                }
                (None, None) => None,
            };
            if let Some(values) = allowed {
                schema = schema.field(key.clone(), FieldRule::AllowedValues(values));
            }

            if let Some(keys) = field.list_of_objects {
                schema = schema.field(key.clone(), FieldRule::ListOfObjects(keys));
            }

            if let Some(min) = field.min_length {
                let rule = match min {
                    MinLengthFile::Text(n) => MinLength {
                        text: Some(n),
                        blocks: Vec::new(),
                    },
                    MinLengthFile::Blocks(blocks) => MinLength {
                        text: None,
                        blocks: blocks.into_iter().collect(),
                    },
                };
                schema = schema.field(key.clone(), FieldRule::MinLength(rule));
            }

            if field.non_empty_list {
                schema = schema.field(key.clone(), FieldRule::NonEmptyList);
            }
        }

        if let Some(policy) = self.policy {
            schema = schema.with_csv_policy(CsvPolicy {
                require_tabulated_if_csv: policy.require_tabulated_if_csv,
                require_written_if_no_csv: policy.require_written_if_no_csv,
            });
            for key in ["TabulatedSummaries", "WrittenSummary"] {
                if let Some(severity) = severities.get(key) {
                    schema.policy_severity.insert(key.to_string(), *severity);
                }
            }
        }

        Ok(schema)
    }
}
