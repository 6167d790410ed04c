//! JSON-RPC envelope types and reserved error codes
//!
//! One request or response per input/output line. The request `id` may be
//! any JSON value (absent is treated as null) and is echoed back verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request envelope
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// Protocol version tag; accepted but not enforced
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// JSON-RPC response envelope
///
/// Carries either a result or an error, never both.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error payload
#[derive(Debug, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Reserved JSON-RPC error codes
pub mod error_codes {
    /// Malformed request line
    pub const PARSE_ERROR: i32 = -32700;
    /// Unknown protocol method
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Required parameter missing or of the wrong type
    pub const INVALID_PARAMS: i32 = -32602;
    /// Uncaught error from a user callable
    pub const HANDLER_ERROR: i32 = -32000;
}
