use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Payload keys that may hold the candidate text, in priority order.
pub const CONTENT_KEYS: [&str; 4] = ["page_content", "text", "definition", "content"];

/// Descriptive fields attached to an indexed passage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateMetadata {
    /// Reference set or tier tag (`ICH`, `MFDS`, `GLOSSARY`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Document section code (`M2.3`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Document label used for citations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub para_id: Option<String>,
    /// Canonical term (terminology entries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    /// Canonical English term (terminology entries).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term_en: Option<String>,
    /// Any other payload fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl CandidateMetadata {
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_term(mut self, term: impl Into<String>) -> Self {
        self.term = Some(term.into());
        self
    }

    pub fn with_term_en(mut self, term_en: impl Into<String>) -> Self {
        self.term_en = Some(term_en.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Reads metadata from a JSON payload object. Unknown keys land in `extra`.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut metadata = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "source" => metadata.source = json_string(value),
                "module" => metadata.module = json_string(value),
                "page" => metadata.page = json_i64(value),
                "region" => metadata.region = json_string(value),
                "doc" => metadata.doc = json_string(value),
                "section" => metadata.section = json_string(value),
                "title" => metadata.title = json_string(value),
                "para_id" | "paraId" => metadata.para_id = json_string(value),
                "term" => metadata.term = json_string(value),
                "term_en" | "termEn" => metadata.term_en = json_string(value),
                k if CONTENT_KEYS.contains(&k) => {}
                _ => {
                    metadata.extra.insert(key.clone(), value.clone());
                }
            }
        }
        metadata
    }

    /// Looks up a named field for filter evaluation.
    pub fn field(&self, key: &str) -> Option<FieldValue> {
        let text = |v: &Option<String>| v.clone().map(FieldValue::Text);
        match key {
            "source" => text(&self.source),
            "module" => text(&self.module),
            "page" => self.page.map(FieldValue::Int),
            "region" => text(&self.region),
            "doc" => text(&self.doc),
            "section" => text(&self.section),
            "title" => text(&self.title),
            "para_id" => text(&self.para_id),
            "term" => text(&self.term),
            "term_en" => text(&self.term_en),
            other => self.extra.get(other).and_then(FieldValue::from_json),
        }
    }

    /// Label used as the citation document: `doc`, then `source`, then `title`.
    pub fn doc_label(&self) -> Option<&str> {
        self.doc
            .as_deref()
            .or(self.source.as_deref())
            .or(self.title.as_deref())
    }

    /// Preferred canonical term for terminology entries.
    pub fn canonical_term(&self) -> Option<&str> {
        self.term.as_deref().or(self.term_en.as_deref())
    }
}

fn json_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// One passage returned by a vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub content: String,
    /// Raw cosine similarity reported by the index.
    pub raw_vector_score: f32,
    pub metadata: CandidateMetadata,
}

impl Candidate {
    pub fn new(id: impl Into<String>, content: impl Into<String>, raw_vector_score: f32) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            raw_vector_score,
            metadata: CandidateMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: CandidateMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builds a candidate from a JSON payload.
    ///
    /// Text comes from the first of [`CONTENT_KEYS`]; metadata from a nested
    /// `metadata` object when present, otherwise from the payload root.
    pub fn from_payload(id: String, score: f32, payload: &Map<String, Value>) -> Self {
        let content = CONTENT_KEYS
            .iter()
            .find_map(|k| payload.get(*k).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string();

        let metadata = match payload.get("metadata") {
            Some(Value::Object(nested)) => CandidateMetadata::from_json_map(nested),
            _ => CandidateMetadata::from_json_map(payload),
        };

        Self {
            id,
            content,
            raw_vector_score: score,
            metadata,
        }
    }
}

/// Scalar payload value used by filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }

    fn loosely_equals(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Text(_), _) | (_, Self::Text(_)) | (Self::Bool(_), _) | (_, Self::Bool(_)) => {
                false
            }
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Inclusive/exclusive numeric bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub gt: Option<f64>,
    pub gte: Option<f64>,
    pub lt: Option<f64>,
    pub lte: Option<f64>,
}

impl NumericRange {
    /// `lo <= x <= hi`.
    pub fn between(lo: f64, hi: f64) -> Self {
        Self {
            gte: Some(lo),
            lte: Some(hi),
            ..Default::default()
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.gt.is_none_or(|b| x > b)
            && self.gte.is_none_or(|b| x >= b)
            && self.lt.is_none_or(|b| x < b)
            && self.lte.is_none_or(|b| x <= b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMatch {
    Equals(FieldValue),
    AnyOf(Vec<FieldValue>),
    Range(NumericRange),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub key: String,
    pub matcher: FieldMatch,
}

impl FieldCondition {
    pub fn matches(&self, metadata: &CandidateMetadata) -> bool {
        let Some(actual) = metadata.field(&self.key) else {
            return false;
        };
        match &self.matcher {
            FieldMatch::Equals(expected) => actual.loosely_equals(expected),
            FieldMatch::AnyOf(options) => options.iter().any(|o| actual.loosely_equals(o)),
            FieldMatch::Range(range) => actual.as_f64().is_some_and(|x| range.contains(x)),
        }
    }
}

/// Conjunction of field conditions applied to candidate metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub must: Vec<FieldCondition>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key == value`.
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.must.push(FieldCondition {
            key: key.into(),
            matcher: FieldMatch::Equals(value.into()),
        });
        self
    }

    /// Adds `key in values`.
    pub fn any_of<V: Into<FieldValue>>(
        mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.must.push(FieldCondition {
            key: key.into(),
            matcher: FieldMatch::AnyOf(values.into_iter().map(Into::into).collect()),
        });
        self
    }

    /// Adds a numeric range on `key`.
    pub fn range(mut self, key: impl Into<String>, range: NumericRange) -> Self {
        self.must.push(FieldCondition {
            key: key.into(),
            matcher: FieldMatch::Range(range),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty()
    }

    pub fn matches(&self, metadata: &CandidateMetadata) -> bool {
        self.must.iter().all(|c| c.matches(metadata))
    }
}
