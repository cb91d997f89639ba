//! JSON-RPC envelope representations
//!
//! Request envelopes are validated by hand from raw JSON so that a shape failure
//! can still salvage the caller's `id`. Response envelopes always carry exactly
//! one of `result` / `error`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};

use crate::errors::ProtocolError;

pub const JSONRPC_VERSION: &str = "2.0";

/// A validated inbound request or notification.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub method: String,
    pub params: Option<Value>,
    /// Normalized id; `None` marks a notification.
    pub id: Option<String>,
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>, params: Option<Value>, id: Option<String>) -> Self {
        Self {
            method: method.into(),
            params,
            id,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validates the envelope shape of a raw JSON value.
    ///
    /// The version member is read from `jsonrpc`, with `protocolVersion` accepted
    /// as an alias; either way it must be the literal string `"2.0"`.
    pub fn from_value(raw: &Value) -> Result<Self, ProtocolError> {
        let Some(object) = raw.as_object() else {
            return Err(shape_error("request must be a JSON object"));
        };

        let version = object
            .get("jsonrpc")
            .or_else(|| object.get("protocolVersion"))
            .and_then(Value::as_str);
        if version != Some(JSONRPC_VERSION) {
            return Err(shape_error("jsonrpc must be exactly \"2.0\""));
        }

        let method = match object.get("method").and_then(Value::as_str) {
            Some(method) if !method.is_empty() => method.to_string(),
            _ => return Err(shape_error("method must be a non-empty string")),
        };

        let params = match object.get("params") {
            None => None,
            Some(params @ (Value::Object(_) | Value::Array(_))) => Some(params.clone()),
            Some(_) => return Err(shape_error("params must be an object or an array")),
        };

        let id = match object.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(number_id(id)),
            Some(_) => return Err(shape_error("id must be a string, a number or null")),
        };

        Ok(Self { method, params, id })
    }
}

/// Best-effort id extraction from input that failed validation.
pub fn salvage_id(raw: &Value) -> Option<String> {
    match raw.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(number_id(id)),
        _ => None,
    }
}

/// Integral floats render without a fraction, so `1.0` and `1` share an id.
fn number_id(id: &Number) -> String {
    match id.as_f64() {
        Some(value) if !id.is_i64() && !id.is_u64() && value.fract() == 0.0 && value.abs() < 1e15 => {
            (value as i64).to_string()
        }
        _ => id.to_string(),
    }
}

fn shape_error(reason: &str) -> ProtocolError {
    ProtocolError::parse_error(json!({ "reason": reason }))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(ProtocolError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub jsonrpc: String,
    pub id: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ResponseEnvelope {
    pub fn result(id: Option<String>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: Option<String>, error: ProtocolError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn as_error(&self) -> Option<&ProtocolError> {
        match &self.outcome {
            Outcome::Error(error) => Some(error),
            Outcome::Result(_) => None,
        }
    }

    pub fn as_result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Result(result) => Some(result),
            Outcome::Error(_) => None,
        }
    }
}

/// An inbound POST body, decoded once: a lone envelope or a batch of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Inbound {
    Batch(Vec<Value>),
    Single(Value),
}

impl Inbound {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// What the host produces for an inbound body that deserves an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Single(ResponseEnvelope),
    Batch(Vec<ResponseEnvelope>),
}

impl Reply {
    pub fn as_single(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Single(envelope) => Some(envelope),
            Self::Batch(_) => None,
        }
    }
}

impl From<ResponseEnvelope> for Reply {
    fn from(envelope: ResponseEnvelope) -> Self {
        Self::Single(envelope)
    }
}
