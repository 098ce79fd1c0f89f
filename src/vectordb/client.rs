use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{Condition, Filter, Range, ScoredPoint, SearchPointsBuilder};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use super::VectorIndex;
use super::error::VectorDbError;
use super::model::{Candidate, FieldCondition, FieldMatch, FieldValue, SearchFilter};

#[derive(Clone)]
/// Qdrant-backed [`VectorIndex`].
pub struct QdrantIndex {
    client: Qdrant,
    url: String,
    payload_prefix: String,
}

impl std::fmt::Debug for QdrantIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantIndex")
            .field("url", &self.url)
            .field("payload_prefix", &self.payload_prefix)
            .finish()
    }
}

impl QdrantIndex {
    /// Creates a client for `url`.
    pub fn new(url: &str) -> Result<Self, VectorDbError> {
        let client =
            Qdrant::from_url(url)
                .build()
                .map_err(|e| VectorDbError::ConnectionFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

        Ok(Self {
            client,
            url: url.to_string(),
            payload_prefix: String::new(),
        })
    }

    /// Prefix prepended to filter keys, e.g. `metadata.` for nested payloads.
    pub fn with_payload_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.payload_prefix = prefix.into();
        self
    }

    /// Returns the configured URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn to_qdrant_filter(&self, filter: &SearchFilter) -> Filter {
        Filter::must(
            filter
                .must
                .iter()
                .map(|c| self.to_qdrant_condition(c))
                .collect::<Vec<_>>(),
        )
    }

    pub(crate) fn to_qdrant_condition(&self, condition: &FieldCondition) -> Condition {
        let key = format!("{}{}", self.payload_prefix, condition.key);
        match &condition.matcher {
            FieldMatch::Equals(value) => equals_condition(&key, value),
            FieldMatch::AnyOf(values) => {
                let texts: Option<Vec<String>> = values
                    .iter()
                    .map(|v| match v {
                        FieldValue::Text(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect();
                if let Some(texts) = texts {
                    return Condition::matches(key, texts);
                }

                let ints: Option<Vec<i64>> = values
                    .iter()
                    .map(|v| match v {
                        FieldValue::Int(i) => Some(*i),
                        _ => None,
                    })
                    .collect();
                if let Some(ints) = ints {
                    return Condition::matches(key, ints);
                }

                Filter::should(
                    values
                        .iter()
                        .map(|v| equals_condition(&key, v))
                        .collect::<Vec<_>>(),
                )
                .into()
            }
            FieldMatch::Range(range) => Condition::range(
                key,
                Range {
                    gt: range.gt,
                    gte: range.gte,
                    lt: range.lt,
                    lte: range.lte,
                },
            ),
        }
    }
}

fn equals_condition(key: &str, value: &FieldValue) -> Condition {
    match value {
        FieldValue::Text(s) => Condition::matches(key, s.clone()),
        FieldValue::Int(i) => Condition::matches(key, *i),
        FieldValue::Bool(b) => Condition::matches(key, *b),
        FieldValue::Float(f) => Condition::range(
            key,
            Range {
                gte: Some(*f),
                lte: Some(*f),
                ..Default::default()
            },
        ),
    }
}

pub(crate) fn qdrant_value_to_json(value: &qdrant_client::qdrant::Value) -> JsonValue {
    match &value.kind {
        Some(Kind::BoolValue(b)) => JsonValue::Bool(*b),
        Some(Kind::IntegerValue(i)) => JsonValue::from(*i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Some(Kind::StringValue(s)) => JsonValue::String(s.clone()),
        Some(Kind::ListValue(list)) => {
            JsonValue::Array(list.values.iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => JsonValue::Object(
            s.fields
                .iter()
                .map(|(k, v)| (k.clone(), qdrant_value_to_json(v)))
                .collect(),
        ),
        Some(Kind::NullValue(_)) | None => JsonValue::Null,
    }
}

fn candidate_from_scored_point(point: ScoredPoint) -> Option<Candidate> {
    let id = match point.id.and_then(|pid| pid.point_id_options) {
        Some(PointIdOptions::Num(n)) => n.to_string(),
        Some(PointIdOptions::Uuid(u)) => u,
        None => return None,
    };

    let payload: Map<String, JsonValue> = point
        .payload
        .iter()
        .map(|(k, v)| (k.clone(), qdrant_value_to_json(v)))
        .collect();

    Some(Candidate::from_payload(id, point.score, &payload))
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<Candidate>, VectorDbError> {
        let mut search_builder =
            SearchPointsBuilder::new(collection, vector, limit).with_payload(true);

        if let Some(filter) = filter.filter(|f| !f.is_empty()) {
            search_builder = search_builder.filter(self.to_qdrant_filter(filter));
        }

        let search_result = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorDbError::SearchFailed {
                collection: collection.to_string(),
                message: e.to_string(),
            })?;

        let candidates: Vec<Candidate> = search_result
            .result
            .into_iter()
            .filter_map(candidate_from_scored_point)
            .collect();

        debug!(
            collection,
            limit,
            returned = candidates.len(),
            "Qdrant search complete"
        );

        Ok(candidates)
    }
}
