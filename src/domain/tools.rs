//! Tools exposed via Model Context Protocol
//!
//! The registry is fixed at startup. `verify_pairec_conf` checks that a
//! PAI-Rec configuration blob decodes as a JSON object (or `null`); it does
//! not check the blob against any PAI-Rec schema.

use rust_mcp_sdk::{
    macros,
    schema::{CallToolResult, ContentBlock, TextContent, Tool},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

pub const VERIFY_PAIREC_CONF: &str = "verify_pairec_conf";
pub const VERIFY_PAIREC_CONF_OK: &str = "Verify pairec config successfully";

#[macros::mcp_tool(name = "verify_pairec_conf", description = "Verify pairec conf")]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct VerifyPairecConfTool {
    /// pairec config to verify
    pub pairec_conf: String,
}

type ToolFn = fn(&Map<String, Value>) -> Result<CallToolResult, AppError>;

pub struct RegisteredTool {
    descriptor: Tool,
    call: ToolFn,
}

impl RegisteredTool {
    pub fn call(&self, arguments: &Map<String, Value>) -> Result<CallToolResult, AppError> {
        (self.call)(arguments)
    }
}

pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn builtin() -> Self {
        Self {
            tools: vec![RegisteredTool {
                descriptor: VerifyPairecConfTool::tool(),
                call: verify_pairec_conf,
            }],
        }
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|tool| tool.descriptor.name == name)
    }

    pub fn descriptors(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|tool| tool.descriptor.clone())
            .collect()
    }
}

pub fn text_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text.into(), None, None))],
        is_error: None,
        meta: None,
        structured_content: None,
    }
}

fn verify_pairec_conf(arguments: &Map<String, Value>) -> Result<CallToolResult, AppError> {
    let params: VerifyPairecConfTool = serde_json::from_value(Value::Object(arguments.clone()))
        .map_err(|_| AppError::invalid_params("Invalid pairec config"))?;

    serde_json::from_str::<Option<Map<String, Value>>>(&params.pairec_conf).map_err(|err| {
        AppError::invalid_params(format!("Invalid pairec config, error: {err}"))
    })?;

    Ok(text_result(VERIFY_PAIREC_CONF_OK))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arguments(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object arguments")
    }

    fn call(value: Value) -> Result<CallToolResult, AppError> {
        ToolRegistry::builtin()
            .get(VERIFY_PAIREC_CONF)
            .expect("builtin tool")
            .call(&arguments(value))
    }

    #[test]
    fn accepts_json_object_config() {
        let result = call(json!({ "pairec_conf": "{\"Listen\":{\"Http\":8080}}" }))
            .expect("config should verify");

        let body = serde_json::to_value(result).expect("result serialization");
        assert_eq!(body["content"][0]["type"], "text");
        assert_eq!(body["content"][0]["text"], VERIFY_PAIREC_CONF_OK);
        assert_eq!(body["content"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn accepts_json_null_config() {
        let result = call(json!({ "pairec_conf": "null" })).expect("null config should verify");
        let body = serde_json::to_value(result).expect("result serialization");
        assert_eq!(body["content"][0]["text"], VERIFY_PAIREC_CONF_OK);
    }

    #[test]
    fn rejects_unparseable_config_with_detail() {
        let error = call(json!({ "pairec_conf": "not-json" })).expect_err("must fail");
        match error {
            AppError::InvalidParams { message } => {
                assert!(message.starts_with("Invalid pairec config, error: "));
                assert!(message.len() > "Invalid pairec config, error: ".len());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_json_that_is_not_an_object() {
        let error = call(json!({ "pairec_conf": "[1, 2]" })).expect_err("must fail");
        assert!(error.to_string().contains("Invalid pairec config, error:"));
    }

    #[test]
    fn rejects_missing_or_non_string_config() {
        for value in [json!({}), json!({ "pairec_conf": 8080 }), json!({ "pairec_conf": null })] {
            let error = call(value).expect_err("must fail");
            assert_eq!(error, AppError::invalid_params("Invalid pairec config"));
        }
    }

    #[test]
    fn registry_lists_single_verify_tool() {
        let registry = ToolRegistry::builtin();
        let tools = registry.descriptors();
        assert_eq!(tools.len(), 1);
        assert!(registry.get("wrong_tool").is_none());

        let tool = serde_json::to_value(&tools[0]).expect("tool serialization");
        assert_eq!(tool["name"], VERIFY_PAIREC_CONF);
        assert_eq!(tool["description"], "Verify pairec conf");
        assert_eq!(tool["inputSchema"]["type"], "object");
        assert_eq!(
            tool["inputSchema"]["properties"]["pairec_conf"]["type"],
            "string"
        );
        assert_eq!(tool["inputSchema"]["required"], json!(["pairec_conf"]));
    }
}
