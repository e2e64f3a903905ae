//! Uniform wrapper around one HTTP response
//!
//! Normalization never fails. A body that is not JSON becomes a `Null`
//! payload, and absent or wrongly typed `Status`/`Results` fields become
//! absent values. Reporting them is the validator's job.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload field carrying the logical status.
pub const STATUS_FIELD: &str = "Status";
/// Payload field carrying the result body.
pub const RESULTS_FIELD: &str = "Results";
/// Stringified JSON array nested in `Results` for the incentive summaries.
pub const JSON_DATA_FIELD: &str = "JsonData";

/// Declared shape of an operation's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// `Results` is an array of records
    List,
    /// `Results` is a single record
    Record,
    /// `Results.JsonData` is a string holding a JSON array of records
    EmbeddedList,
}

impl ResultShape {
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::List | Self::EmbeddedList)
    }
}

/// Parsed result body. Exactly one variant exists per response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultBody {
    List(Vec<Value>),
    Record(Map<String, Value>),
}

#[derive(Debug, Clone)]
pub struct NormalizedResponse {
    raw_body: String,
    payload: Value,
    status_code: u16,
    logical_status: Option<String>,
    result: Option<ResultBody>,
}

impl NormalizedResponse {
    /// Normalize a raw response body according to the operation's shape.
    #[must_use]
    pub fn from_body(status_code: u16, raw_body: impl Into<String>, shape: ResultShape) -> Self {
        let raw_body = raw_body.into();
        let payload = serde_json::from_str(&raw_body).unwrap_or(Value::Null);
        Self::build(status_code, raw_body, payload, shape)
    }

    /// Normalize an already parsed payload.
    #[must_use]
    pub fn from_payload(status_code: u16, payload: Value, shape: ResultShape) -> Self {
        let raw_body = payload.to_string();
        Self::build(status_code, raw_body, payload, shape)
    }

    fn build(status_code: u16, raw_body: String, payload: Value, shape: ResultShape) -> Self {
        let logical_status = logical_status(&payload);
        let result = match shape {
            ResultShape::List => match payload.get(RESULTS_FIELD) {
                Some(Value::Array(items)) => Some(ResultBody::List(items.clone())),
                _ => None,
            },
            ResultShape::Record => match payload.get(RESULTS_FIELD) {
                Some(Value::Object(record)) => Some(ResultBody::Record(record.clone())),
                _ => None,
            },
            ResultShape::EmbeddedList => embedded_list(&payload).map(ResultBody::List),
        };

        Self {
            raw_body,
            payload,
            status_code,
            logical_status,
            result,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    #[must_use]
    pub fn logical_status(&self) -> Option<&str> {
        self.logical_status.as_deref()
    }

    /// Body exactly as delivered.
    #[must_use]
    pub fn raw_body(&self) -> &str {
        &self.raw_body
    }

    /// Parsed body; `Null` when the body was not JSON.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    #[must_use]
    pub fn result(&self) -> Option<&ResultBody> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn list_result(&self) -> Option<&[Value]> {
        match &self.result {
            Some(ResultBody::List(items)) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn map_result(&self) -> Option<&Map<String, Value>> {
        match &self.result {
            Some(ResultBody::Record(record)) => Some(record),
            _ => None,
        }
    }

    /// Pretty-printed payload, or the raw body if it was not JSON.
    #[must_use]
    pub fn pretty(&self) -> String {
        if self.payload.is_null() {
            return self.raw_body.clone();
        }
        serde_json::to_string_pretty(&self.payload).unwrap_or_else(|_| self.raw_body.clone())
    }
}

fn logical_status(payload: &Value) -> Option<String> {
    match payload.get(STATUS_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The stringified `Results.JsonData` field, if present.
#[must_use]
pub fn embedded_json_data(payload: &Value) -> Option<&str> {
    payload.get(RESULTS_FIELD)?.get(JSON_DATA_FIELD)?.as_str()
}

fn embedded_list(payload: &Value) -> Option<Vec<Value>> {
    let text = embedded_json_data(payload)?;
    match serde_json::from_str(text) {
        Ok(Value::Array(items)) => Some(items),
        _ => None,
    }
}
