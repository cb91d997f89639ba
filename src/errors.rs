use std::fmt;

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ConfigError;

/// JSON-RPC error codes understood by the host.
///
/// Application handlers may surface any other integer through [`ErrorCode::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    Custom(i64),
}

impl ErrorCode {
    pub fn as_i64(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::Custom(code) => code,
        }
    }

    /// HTTP status used when an error envelope is the whole answer to a POST.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::ParseError | Self::InvalidRequest | Self::InvalidParams => {
                StatusCode::BAD_REQUEST
            }
            Self::MethodNotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Custom(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            other => Self::Custom(other),
        }
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        code.as_i64()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// The `error` member of a response envelope.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ProtocolError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ProtocolError {
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data,
        }
    }

    pub fn parse_error(data: Value) -> Self {
        Self::new(ErrorCode::ParseError, "Parse Error", Some(data))
    }

    pub fn invalid_request(data: Value) -> Self {
        Self::new(ErrorCode::InvalidRequest, "Invalid Request", Some(data))
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method {method} not found"),
            None,
        )
    }

    pub fn invalid_params(data: Value) -> Self {
        Self::new(ErrorCode::InvalidParams, "Invalid params", Some(data))
    }

    pub fn internal_error() -> Self {
        Self::new(ErrorCode::InternalError, "Internal Error", None)
    }
}

/// Failure returned by a method handler.
///
/// `Protocol` errors reach the caller verbatim; `Internal` details are logged
/// and replaced with a generic InternalError.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("internal handler failure: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn internal(detail: impl fmt::Display) -> Self {
        Self::Internal(detail.to_string())
    }

    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::Protocol(ProtocolError::invalid_params(json!([reason.into()])))
    }
}

/// Failure returned by a pipe stage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipeError {
    /// The parameters were rejected; the reason ends up in InvalidParams `data`.
    #[error("parameters rejected: {0}")]
    Rejected(Value),
    /// The stage itself broke; aborts the call with InternalError.
    #[error("pipe stage crashed: {0}")]
    Crashed(String),
}

impl PipeError {
    pub fn rejected(reason: impl Into<Value>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Fatal conditions raised while assembling a server, before it serves traffic.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("method with name {0} already registered")]
    DuplicateMethod(String),
    #[error("tool {0} is duplicated")]
    DuplicateTool(String),
    #[error("resource {0} is duplicated")]
    DuplicateResource(String),
    #[error("invalid input schema for tool {tool}: {reason}")]
    InvalidToolSchema { tool: String, reason: String },
    #[error("{0} transport is not supported")]
    UnsupportedTransport(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Misuse of the push channel or failure of the underlying listener.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("push channel not started")]
    NoPushChannel,
    #[error("unknown push session {0}")]
    UnknownSession(String),
    #[error("push channel for session {0} is closed")]
    ChannelClosed(String),
    #[error("failed to serialize outbound message: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("transport i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
