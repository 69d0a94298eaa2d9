//! MCP JSON-RPC request handler.
//!
//! Decodes protocol methods and dispatches tool calls against the
//! application state.

use crate::state::AppState;
use crate::tools;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

/// MCP protocol version we support.
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// JSON-RPC error code for a missing or invalid session.
pub const ERROR_NO_SESSION: i32 = -32000;
/// JSON-RPC error code for an unknown method.
pub const ERROR_METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC error code for invalid tool parameters.
pub const ERROR_INVALID_PARAMS: i32 = -32602;
/// JSON-RPC error code for internal failures.
pub const ERROR_INTERNAL: i32 = -32603;

/// JSON-RPC 2.0 Request.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 Response.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Create an error response with data.
    pub fn error_with_data(
        id: Option<Value>,
        code: i32,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: Some(data),
            }),
        }
    }
}

/// JSON-RPC 2.0 Error.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Tool call parameters from MCP.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// MCP request handler with direct AppState access.
pub struct McpHandler;

impl McpHandler {
    /// Handle an MCP JSON-RPC request.
    ///
    /// Returns `None` for notifications, which need no response body.
    pub async fn handle_request(
        state: &AppState,
        request: JsonRpcRequest,
    ) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        debug!("MCP: Handling method: {}", request.method);

        match request.method.as_str() {
            "initialize" => Some(Self::handle_initialize(id)),
            "initialized" | "notifications/initialized" => {
                // Notification, no response needed
                None
            }
            "ping" => Some(JsonRpcResponse::success(id, json!({}))),
            "tools/list" => Some(JsonRpcResponse::success(
                id,
                json!({ "tools": [tools::descriptor()] }),
            )),
            "tools/call" => {
                let result =
                    Self::handle_call_tool(state, request.params.unwrap_or(json!({}))).await;
                Some(match result {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(ToolError::Validation(failures)) => JsonRpcResponse::error_with_data(
                        id,
                        ERROR_INVALID_PARAMS,
                        "Invalid tool arguments",
                        json!({ "fields": failures }),
                    ),
                    Err(ToolError::Internal(e)) => {
                        error!("MCP: Tool call failed: {:#}", e);
                        JsonRpcResponse::error(
                            id,
                            ERROR_INTERNAL,
                            format!("Tool call failed: {}", e),
                        )
                    }
                })
            }
            "notifications/cancelled" => {
                // Client cancelled a request - acknowledge
                None
            }
            _ => Some(JsonRpcResponse::error(
                id,
                ERROR_METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        }
    }

    /// Handle the initialize request.
    fn handle_initialize(id: Option<Value>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "followup",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    /// Handle a tools/call request.
    async fn handle_call_tool(state: &AppState, params: Value) -> Result<Value, ToolError> {
        let tool_params: ToolCallParams =
            serde_json::from_value(params).map_err(|e| ToolError::Internal(e.into()))?;
        let args = tool_params.arguments.unwrap_or(json!({}));

        match tool_params.name.as_str() {
            tools::TOOL_NAME => tools::send_meeting_recap(state, args).await,
            other => {
                error!("MCP: Unknown tool: {}", other);
                Err(ToolError::Internal(anyhow::anyhow!(
                    "Unknown tool: {}",
                    other
                )))
            }
        }
    }
}

/// Failure modes of a tool call.
#[derive(Debug)]
pub enum ToolError {
    /// The payload failed validation; lists every violated field.
    Validation(Vec<followup_types::ValidationFailure>),
    /// Anything else. Mapped to a generic internal error response.
    Internal(anyhow::Error),
}
