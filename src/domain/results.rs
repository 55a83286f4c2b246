//! Decoded results and the response envelope
//!
//! Keys starting with a reserved marker (`_` or `#`) carry structural
//! metadata and are kept apart from user document fields.

use crate::domain::entities::ResponseKey;
use crate::domain::errors::ClientError;
use crate::domain::repositories::RecordSource;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, VecDeque};

pub const RESERVED_MARKERS: [char; 2] = ['_', '#'];

pub fn is_reserved(key: &str) -> bool {
    key.starts_with(&RESERVED_MARKERS[..])
}

/// Find a reserved key by its bare name, whichever marker it was sent with
fn lookup_reserved<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    let bare = name.trim_start_matches(&RESERVED_MARKERS[..]);
    RESERVED_MARKERS
        .iter()
        .find_map(|marker| map.get(&format!("{}{}", marker, bare)))
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Response headers, keyed by lowercased name with `-` mapped to `_`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: BTreeMap<String, String>,
}

impl Metadata {
    fn normalize(name: &str) -> String {
        name.to_ascii_lowercase().replace('-', "_")
    }

    pub fn from_headers(headers: &[(String, String)]) -> Self {
        let entries = headers
            .iter()
            .map(|(k, v)| (Self::normalize(k), v.clone()))
            .collect();
        Self { entries }
    }

    /// Accepts either spelling: `x-matched-count` or `x_matched_count`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&Self::normalize(name)).map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get("content_type")
    }

    /// Size hint sent by the server with query responses
    pub fn matched_count(&self) -> Option<u64> {
        self.get("x_matched_count").and_then(|v| v.trim().parse().ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Nested aggregation results with dotted-path access
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregations(Map<String, Value>);

impl Aggregations {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Walk `a.b.0.c` through nested objects and arrays
    pub fn path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A decoded record with reserved keys lifted out of the user fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Map<String, Value>,
    reserved: Map<String, Value>,
    // Non-object payloads (raw text lines, scalars) are kept whole
    other: Option<Value>,
}

impl Document {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => {
                let (reserved, fields) = map.into_iter().partition(|(k, _)| is_reserved(k));
                Self {
                    fields,
                    reserved,
                    other: None,
                }
            }
            other => Self {
                other: Some(other),
                ..Self::default()
            },
        }
    }

    /// User field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Reserved field by bare name (`id` finds `_id` or `#id`)
    pub fn reserved(&self, name: &str) -> Option<&Value> {
        lookup_reserved(&self.reserved, name)
    }

    pub fn id(&self) -> Option<&Value> {
        self.reserved("id")
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn reserved_fields(&self) -> &Map<String, Value> {
        &self.reserved
    }

    /// Text of a non-object record, e.g. a line of a non-JSON stream
    pub fn as_str(&self) -> Option<&str> {
        self.other.as_ref().and_then(Value::as_str)
    }

    /// Reassemble the record as it was received
    pub fn into_value(self) -> Value {
        match self.other {
            Some(value) => value,
            None => {
                let mut map = self.fields;
                map.extend(self.reserved);
                Value::Object(map)
            }
        }
    }
}

/// Records already held in memory
#[derive(Debug, Default)]
pub struct BufferedRecords(VecDeque<Value>);

impl BufferedRecords {
    pub fn new(records: impl IntoIterator<Item = Value>) -> Self {
        Self(records.into_iter().collect())
    }
}

#[async_trait]
impl RecordSource for BufferedRecords {
    async fn next_record(&mut self) -> Option<Result<Value, ClientError>> {
        self.0.pop_front().map(Ok)
    }
}

/// Single-pass result set over a decoded record stream.
///
/// Records are consumed as they are read; once exhausted it stays exhausted.
pub struct Results {
    query: Map<String, Value>,
    aggregations: Aggregations,
    metadata: Metadata,
    source: Box<dyn RecordSource>,
}

impl Results {
    /// `meta` is the leading record of a streamed response, or `Value::Null`
    pub fn new(meta: Value, metadata: Metadata, source: Box<dyn RecordSource>) -> Self {
        let meta = match meta {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let query = match lookup_reserved(&meta, "query") {
            Some(Value::Object(query)) => query
                .iter()
                .filter(|(k, _)| is_reserved(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Map::new(),
        };

        let aggregations = match lookup_reserved(&meta, "aggregations") {
            Some(Value::Object(aggs)) => Aggregations::new(aggs.clone()),
            _ => Aggregations::default(),
        };

        Self {
            query,
            aggregations,
            metadata,
            source,
        }
    }

    /// Reserved query-echo field by bare name (`total_count`, `matches_estimated`, ...)
    pub fn query_value(&self, name: &str) -> Option<&Value> {
        lookup_reserved(&self.query, name)
    }

    pub fn query(&self) -> &Map<String, Value> {
        &self.query
    }

    pub fn aggregations(&self) -> &Aggregations {
        &self.aggregations
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Total matches reported by the server, independent of how many records remain
    pub fn total_count(&self) -> u64 {
        self.query_value("total_count")
            .and_then(as_count)
            .or_else(|| self.metadata.matched_count())
            .or_else(|| self.metadata.get("total_count").and_then(|v| v.parse().ok()))
            .unwrap_or(0)
    }

    pub fn matches_estimated(&self) -> Option<u64> {
        self.query_value("matches_estimated")
            .and_then(as_count)
            .or_else(|| self.metadata.get("matches_estimated").and_then(|v| v.parse().ok()))
    }

    pub fn len(&self) -> usize {
        self.total_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn next(&mut self) -> Option<Result<Document, ClientError>> {
        self.source
            .next_record()
            .await
            .map(|record| record.map(Document::from_value))
    }

    /// Drain the remaining records
    pub async fn try_collect(mut self) -> Result<Vec<Document>, ClientError> {
        let mut documents = Vec::new();
        while let Some(document) = self.next().await {
            documents.push(document?);
        }
        Ok(documents)
    }
}

impl std::fmt::Debug for Results {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Results")
            .field("query", &self.query)
            .field("aggregations", &self.aggregations)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Decoded payload filed under the action's response key
#[derive(Debug)]
pub enum Payload {
    Result(Document),
    Results(Results),
    /// Non-JSON body of a non-streamed response
    Raw(Vec<u8>),
    /// The server sent no body (e.g. `HEAD`)
    Empty,
}

/// Uniform result of every action
#[derive(Debug)]
pub struct Response {
    key: ResponseKey,
    status: u16,
    payload: Payload,
    metadata: Metadata,
}

impl Response {
    pub fn new(key: ResponseKey, status: u16, payload: Payload, metadata: Metadata) -> Self {
        Self {
            key,
            status,
            payload,
            metadata,
        }
    }

    /// Stand-in returned when a missing document has a caller-supplied default
    pub fn from_default(value: Value) -> Self {
        Self::new(
            ResponseKey::Result,
            404,
            Payload::Result(Document::from_value(value)),
            Metadata::default(),
        )
    }

    pub fn key(&self) -> ResponseKey {
        self.key
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Value of the `x-matched-count` header
    pub fn size(&self) -> Option<u64> {
        self.metadata.matched_count()
    }

    pub fn document(&self) -> Option<&Document> {
        match &self.payload {
            Payload::Result(document) => Some(document),
            _ => None,
        }
    }

    pub fn into_document(self) -> Option<Document> {
        match self.payload {
            Payload::Result(document) => Some(document),
            _ => None,
        }
    }

    pub fn into_results(self) -> Option<Results> {
        match self.payload {
            Payload::Results(results) => Some(results),
            _ => None,
        }
    }

    pub fn raw(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}
