//! Interpret request/response types
//!
//! `POST /commands/interpret` answers with one of two shapes:
//!
//! ```text
//! { "success": bool, "message": str, "data"?: {...} }          → CommandResult
//! { "field": str, "message": str, "options": [{id,label,..}] }  → ClarificationRequest
//! ```
//!
//! The shapes carry no tag on the wire, so [`InterpretResponse`] performs the
//! discrimination once, here, and rejects payloads that fit neither.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::agent::RecordId;
use crate::default_true;

/// Ambiguous-field name → chosen option, accumulated across clarification rounds.
pub type ResolvedFields = BTreeMap<String, Value>;

// ============================================================================
// REQUEST
// ============================================================================

/// Body of `POST /commands/interpret`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretRequest {
    pub text: String,
    #[serde(default)]
    pub context: ResolvedFields,
}

impl InterpretRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: ResolvedFields::new(),
        }
    }

    pub fn with_context(mut self, context: ResolvedFields) -> Self {
        self.context = context;
        self
    }
}

// ============================================================================
// CLARIFICATION
// ============================================================================

/// One selectable answer to a clarification.
///
/// Agents attach arbitrary extra attributes (school code, class section, ...)
/// which are kept verbatim and echoed back in the resolution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationOption {
    pub id: RecordId,
    pub label: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ClarificationOption {
    pub fn new(id: impl Into<RecordId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// The value merged into the resolution context: `{id, label, ...attributes}`.
    pub fn to_context_value(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "id".to_string(),
            match &self.id {
                RecordId::Int(n) => Value::from(*n),
                RecordId::Text(s) => Value::from(s.clone()),
            },
        );
        object.insert("label".to_string(), Value::from(self.label.clone()));
        for (key, value) in &self.attributes {
            object.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(object)
    }
}

/// Server request to resolve an ambiguous parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    /// Ambiguous parameter name (school, staff, class, item, category, ...)
    pub field: String,
    /// Prompt to show the user
    #[serde(default)]
    pub message: String,
    pub options: Vec<ClarificationOption>,
}

impl ClarificationRequest {
    /// Find an option by id
    pub fn option(&self, id: &RecordId) -> Option<&ClarificationOption> {
        self.options.iter().find(|o| &o.id == id)
    }
}

// ============================================================================
// RESULT
// ============================================================================

/// Counter carried in a result payload.
///
/// Most agents send JSON numbers; decimal amounts often arrive as strings
/// (`"12500.00"`) and are kept verbatim rather than re-formatted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Metric {
    Number(Number),
    Text(String),
}

impl Metric {
    /// A JSON number or a non-blank string; anything else is not a counter.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Metric::Number(n.clone())),
            Value::String(s) if !s.trim().is_empty() => Some(Metric::Text(s.trim().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Number(n) => write!(f, "{}", n),
            Metric::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Metric {
    fn from(n: i64) -> Self {
        Metric::Number(Number::from(n))
    }
}

impl From<Number> for Metric {
    fn from(n: Number) -> Self {
        Metric::Number(n)
    }
}

impl From<&str> for Metric {
    fn from(s: &str) -> Self {
        Metric::Text(s.to_string())
    }
}

/// One entry of `data.by_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: Metric,
}

/// Heterogeneous agent payload. Only the keys below have meaning to the
/// desk; anything else is preserved in `extra`.
///
/// Decoding never fails. Known keys of an unexpected type are moved to
/// `extra`, non-object rows are dropped, and a bare row list is read as
/// `results`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct ResultData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<Metric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by_status: Option<Vec<StatusCount>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Map<String, Value>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Value> for ResultData {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(object) => {
                let mut data = ResultData::default();
                for (key, value) in object {
                    if let Some(rejected) = data.accept(&key, value) {
                        data.extra.insert(key, rejected);
                    }
                }
                data
            }
            Value::Array(rows) => ResultData {
                results: Some(object_rows(rows)),
                ..ResultData::default()
            },
            Value::Null => ResultData::default(),
            other => {
                let mut extra = Map::new();
                extra.insert("value".to_string(), other);
                ResultData {
                    extra,
                    ..ResultData::default()
                }
            }
        }
    }
}

impl ResultData {
    /// Store a known key. Hands the value back if the key is unknown or the
    /// value has the wrong shape.
    fn accept(&mut self, key: &str, value: Value) -> Option<Value> {
        match key {
            "count" | "total" | "total_value" if value.is_null() => None,
            "count" | "total" | "total_value" => {
                let Some(metric) = Metric::from_value(&value) else {
                    return Some(value);
                };
                let slot = match key {
                    "count" => &mut self.count,
                    "total" => &mut self.total,
                    _ => &mut self.total_value,
                };
                *slot = Some(metric);
                None
            }
            "by_status" => match status_counts(&value) {
                Some(entries) => {
                    self.by_status = Some(entries);
                    None
                }
                None => Some(value),
            },
            "results" => match value {
                Value::Array(rows) => {
                    self.results = Some(object_rows(rows));
                    None
                }
                other => Some(other),
            },
            _ => Some(value),
        }
    }
}

/// `[{status, count}, ...]` or `{status: count, ...}`; malformed entries are skipped.
fn status_counts(value: &Value) -> Option<Vec<StatusCount>> {
    match value {
        Value::Array(entries) => Some(
            entries
                .iter()
                .filter_map(|entry| {
                    let status = entry.get("status")?.as_str()?;
                    let count = Metric::from_value(entry.get("count")?)?;
                    Some(StatusCount {
                        status: status.to_string(),
                        count,
                    })
                })
                .collect(),
        ),
        Value::Object(map) => Some(
            map.iter()
                .filter_map(|(status, count)| {
                    Some(StatusCount {
                        status: status.clone(),
                        count: Metric::from_value(count)?,
                    })
                })
                .collect(),
        ),
        _ => None,
    }
}

fn object_rows(rows: Vec<Value>) -> Vec<Map<String, Value>> {
    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
}

/// Terminal answer from an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResultData>,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: ResultData) -> Self {
        self.data = Some(data);
        self
    }
}

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// Payload matched neither a result nor a clarification
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MalformedPayload(pub String);

/// Decoded `POST /commands/interpret` response
#[derive(Debug, Clone, PartialEq)]
pub enum InterpretResponse {
    Result(CommandResult),
    Clarification(ClarificationRequest),
}

impl InterpretResponse {
    pub fn is_clarification(&self) -> bool {
        matches!(self, InterpretResponse::Clarification(_))
    }

    /// Decode a raw response body
    pub fn from_slice(body: &[u8]) -> Result<Self, MalformedPayload> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| MalformedPayload(format!("response is not JSON: {}", e)))?;
        Self::try_from(value)
    }
}

impl TryFrom<Value> for InterpretResponse {
    type Error = MalformedPayload;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Some(object) = value.as_object() else {
            return Err(MalformedPayload(
                "expected a JSON object response".to_string(),
            ));
        };

        let has_field = object.contains_key("field");
        let has_options = object.contains_key("options");

        match (has_field, has_options) {
            (true, true) => serde_json::from_value(value)
                .map(InterpretResponse::Clarification)
                .map_err(|e| MalformedPayload(format!("invalid clarification: {}", e))),
            (true, false) | (false, true) => Err(MalformedPayload(
                "clarification requires both `field` and `options`".to_string(),
            )),
            (false, false) => {
                let looks_like_result = ["success", "message", "data"]
                    .iter()
                    .any(|k| object.contains_key(*k));
                if !looks_like_result {
                    return Err(MalformedPayload(
                        "payload matches neither a result nor a clarification".to_string(),
                    ));
                }
                serde_json::from_value(value)
                    .map(InterpretResponse::Result)
                    .map_err(|e| MalformedPayload(format!("invalid result: {}", e)))
            }
        }
    }
}

impl Serialize for InterpretResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InterpretResponse::Result(result) => result.serialize(serializer),
            InterpretResponse::Clarification(request) => request.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for InterpretResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        InterpretResponse::try_from(value).map_err(D::Error::custom)
    }
}
