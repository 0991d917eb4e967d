use serde_json::{json, Value};
use thiserror::Error;

use crate::mcp::rpc::{ErrorCode, RpcError};

/// Failure raised by a method handler. Every variant maps onto exactly one
/// JSON-RPC error code.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AppError {
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    #[error("method not found: {method}")]
    MethodNotFound { method: String },
    #[error("invalid params: {message}")]
    InvalidParams { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::MethodNotFound { .. } => ErrorCode::MethodNotFound,
            Self::InvalidParams { .. } => ErrorCode::InvalidParams,
            Self::Internal { .. } => ErrorCode::InternalError,
        }
    }
}

impl From<AppError> for RpcError {
    fn from(err: AppError) -> Self {
        let code = err.code();
        match err {
            AppError::InvalidRequest { message } | AppError::InvalidParams { message } => {
                RpcError::new(code, message)
            }
            AppError::MethodNotFound { method } => {
                RpcError::new(code, "Method not found").with_data(json!({ "method": method }))
            }
            AppError::Internal { message } => {
                tracing::error!(error = %message, "request failed with internal error");
                RpcError::new(code, "Internal error")
            }
        }
    }
}

/// Detail attached to `InvalidRequest` responses produced before dispatch.
pub fn envelope_error_data(reason: &str) -> Value {
    json!({ "reason": reason })
}
