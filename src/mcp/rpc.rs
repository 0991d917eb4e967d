//! JSON-RPC envelopes and the line codec
//!
//! One request or response per line. Decoding never panics on input and
//! encoding always yields exactly one trailing newline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

/// The closed set of error codes this server ever reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// A decoded request. `id == None` marks a notification; a JSON `null` id
/// is kept as `Some(Value::Null)` and still gets a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl Request {
    pub fn new(
        id: Option<Value>,
        method: impl Into<String>,
        params: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    #[serde(rename = "result")]
    Success(Value),
    #[serde(rename = "error")]
    Failure(RpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Success(result),
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Failure(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }
}

#[derive(Debug, Error)]
pub enum DecodeFailure {
    #[error("line is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid request envelope: {reason}")]
    InvalidEnvelope {
        /// The `id` member if the object carried one, so the caller can answer.
        id: Option<Value>,
        reason: &'static str,
    },
}

impl DecodeFailure {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Malformed(_) => ErrorCode::ParseError,
            Self::InvalidEnvelope { .. } => ErrorCode::InvalidRequest,
        }
    }
}

fn invalid_envelope(id: Option<Value>, reason: &'static str) -> DecodeFailure {
    DecodeFailure::InvalidEnvelope { id, reason }
}

/// Decode a single line (with or without its trailing newline).
pub fn decode_line(line: &[u8]) -> Result<Request, DecodeFailure> {
    let value: Value = serde_json::from_slice(line)?;
    let Value::Object(mut object) = value else {
        return Err(invalid_envelope(None, "envelope must be a JSON object"));
    };

    let id = match object.remove("id") {
        None => None,
        Some(id @ (Value::String(_) | Value::Number(_) | Value::Null)) => Some(id),
        Some(_) => {
            return Err(invalid_envelope(
                Some(Value::Null),
                "id must be a string, number or null",
            ))
        }
    };

    let jsonrpc = match object.remove("jsonrpc") {
        Some(Value::String(version)) if version == JSONRPC_VERSION => version,
        _ => return Err(invalid_envelope(id, "jsonrpc must be \"2.0\"")),
    };

    let method = match object.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(invalid_envelope(id, "method must be a string")),
    };

    let params = match object.remove("params") {
        None | Some(Value::Null) => None,
        Some(Value::Object(params)) => Some(params),
        Some(_) => return Err(invalid_envelope(id, "params must be an object")),
    };

    Ok(Request {
        jsonrpc,
        id,
        method,
        params,
    })
}

/// Encode a response as one newline-terminated line.
pub fn encode_response(response: &Response) -> Result<Vec<u8>, serde_json::Error> {
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    Ok(line)
}
