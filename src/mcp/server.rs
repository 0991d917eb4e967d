//! The central Model Context Protocol engine
//!
//! Routes decoded requests to the handshake handlers (`initialize`,
//! `tools/list`, `tools/call`), decodes each method's params into a typed
//! structure and tracks the connection phase.

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ListToolsResult, ServerCapabilities,
    ServerCapabilitiesTools,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::HandshakePolicy;
use crate::domain::tools::RegisteredTool;
use crate::errors::AppError;
use crate::mcp::rpc::{Request, Response};
use crate::AppState;

pub const SERVER_NAME: &str = "PAI-Rec MCP Server";
pub const SERVER_VERSION: &str = "1.0.0";
pub const SERVER_INSTRUCTIONS: &str = "Hello, welcome to the PAI-Rec MCP server!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Ready,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct InitializeParams {
    pub protocol_version: String,
}

impl InitializeParams {
    /// Never fails: a missing or non-string `protocolVersion` becomes "".
    pub fn from_params(params: Option<&Map<String, Value>>) -> Self {
        match params.and_then(|params| params.get("protocolVersion")) {
            None => Self::default(),
            Some(Value::String(version)) => Self {
                protocol_version: version.clone(),
            },
            Some(other) => {
                warn!(value = %other, "ignoring non-string protocolVersion");
                Self::default()
            }
        }
    }
}

pub struct CallToolParams<'a> {
    pub tool: &'a RegisteredTool,
    pub arguments: &'a Map<String, Value>,
}

impl<'a> CallToolParams<'a> {
    /// Resolves the tool before looking at `arguments`, so an unknown tool is
    /// reported even when the arguments are malformed too.
    pub fn from_params(
        params: Option<&'a Map<String, Value>>,
        state: &'a AppState,
    ) -> Result<Self, AppError> {
        let tool = params
            .and_then(|params| params.get("name"))
            .and_then(Value::as_str)
            .and_then(|name| state.tools.get(name))
            .ok_or_else(|| AppError::invalid_params("Invalid tool name"))?;

        let arguments = params
            .and_then(|params| params.get("arguments"))
            .and_then(Value::as_object)
            .ok_or_else(|| AppError::invalid_params("Invalid tool arguments"))?;

        Ok(Self { tool, arguments })
    }
}

/// Per-connection dispatcher. Handlers run to completion synchronously;
/// the only mutable state is the handshake phase.
pub struct Session {
    state: AppState,
    phase: Phase,
}

impl Session {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            phase: Phase::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns `None` for notifications and for methods that never answer.
    pub fn handle_request(&mut self, request: Request) -> Option<Response> {
        let Request {
            id, method, params, ..
        } = request;

        let outcome = self.dispatch(&method, params.as_ref());
        let id_label = id.as_ref().map(Value::to_string).unwrap_or_default();

        let (Some(id), Some(outcome)) = (id, outcome) else {
            info!(method = %method, id = %id_label, outcome = "notification", "mcp action audited");
            return None;
        };

        let response = match outcome {
            Ok(result) => Response::success(id, result),
            Err(err) => {
                debug!(method = %method, error = %err, "request failed");
                Response::failure(id, err.into())
            }
        };

        info!(
            method = %method,
            id = %id_label,
            outcome = if response.is_error() { "failure" } else { "success" },
            "mcp action audited"
        );

        Some(response)
    }

    /// `None` means the method produces no response at all.
    fn dispatch(
        &mut self,
        method: &str,
        params: Option<&Map<String, Value>>,
    ) -> Option<Result<Value, AppError>> {
        match method {
            "initialize" => Some(self.initialize(params)),
            "tools/list" => Some(self.list_tools()),
            "tools/call" => Some(self.call_tool(params)),
            "notifications/initialized" => {
                debug!("client reported initialized");
                None
            }
            _ => Some(Err(AppError::method_not_found(method))),
        }
    }

    fn initialize(&mut self, params: Option<&Map<String, Value>>) -> Result<Value, AppError> {
        let params = InitializeParams::from_params(params);

        let result = InitializeResult {
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
                title: None,
                description: None,
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(true),
                }),
                ..Default::default()
            },
            protocol_version: params.protocol_version,
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            meta: None,
        };

        let value = to_result_value(&result)?;
        self.phase = Phase::Ready;
        Ok(value)
    }

    fn list_tools(&self) -> Result<Value, AppError> {
        self.require_ready()?;
        to_result_value(&ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: self.state.tools.descriptors(),
        })
    }

    fn call_tool(&self, params: Option<&Map<String, Value>>) -> Result<Value, AppError> {
        self.require_ready()?;
        let call = CallToolParams::from_params(params, &self.state)?;
        let result = call.tool.call(call.arguments)?;
        to_result_value(&result)
    }

    fn require_ready(&self) -> Result<(), AppError> {
        match (self.state.handshake, self.phase) {
            (HandshakePolicy::Strict, Phase::Uninitialized) => {
                Err(AppError::invalid_request("Server not initialized"))
            }
            _ => Ok(()),
        }
    }
}

fn to_result_value<T: Serialize>(result: &T) -> Result<Value, AppError> {
    serde_json::to_value(result)
        .map_err(|err| AppError::internal(format!("result serialization failed: {err}")))
}
