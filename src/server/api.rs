//! JSON-RPC 2.0 API served over stdio.
//!
//! This module provides the wire layer of the service including:
//! - JSON-RPC 2.0 request/response handling
//! - Token authentication before method dispatch
//! - Stdio-based server communication

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use super::{handle_method, SharedState};
use crate::error::ApiError;

#[cfg(test)]
#[path = "api_tests.rs"]
mod api_tests;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
    /// Bearer token for authenticated methods.
    ///
    /// A gateway in front of the service copies the Authorization
    /// header here; `ping` is the only method served without it.
    #[serde(default)]
    pub auth: Option<String>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier (null if notification, must always be present per spec).
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Create an error response from an API error, carrying its code and data
    pub fn rejection(id: Option<Value>, error: &ApiError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code: error.code(),
                message: error.to_string(),
                data: error.data(),
            }),
        }
    }
}

/// API server running over stdio.
///
/// Handles JSON-RPC 2.0 messages over stdin/stdout. Every method except
/// `ping` is gated on the request's `auth` token before dispatch.
pub struct ApiServer {
    /// Shared application state.
    state: SharedState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server using async stdio
    pub async fn run(&self) -> std::io::Result<()> {
        info!("Survey flow server starting...");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let response = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => self.handle_request(request).await,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    Some(JsonRpcResponse::error(
                        None,
                        -32700,
                        format!("Parse error: {}", e),
                    ))
                }
            };

            // Only send response if not a notification (per JSON-RPC 2.0 spec)
            if let Some(response) = response {
                let response_json = serde_json::to_string(&response)?;
                debug!(response = %response_json, "Sending response");

                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request
    /// Returns None for notifications (requests without id) per JSON-RPC 2.0 spec
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        // Check if this is a notification (no id = no response required)
        let is_notification = request.id.is_none();

        // Liveness check, served without a token
        if request.method == "ping" {
            return Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            ));
        }

        // Every other method requires a valid token before any dispatch
        if let Err(error) = self.state.auth.authenticate(request.auth.as_deref()) {
            if is_notification {
                debug!(method = %request.method, "Unauthenticated notification, dropping");
                return None;
            }
            warn!(method = %request.method, "Rejected unauthenticated request");
            return Some(JsonRpcResponse::rejection(request.id, &error));
        }

        match handle_method(&self.state, &request.method, request.params).await {
            Ok(result) => Some(JsonRpcResponse::success(request.id, result)),
            Err(error) => {
                // Unknown notifications are dropped rather than answered
                if is_notification && matches!(error, ApiError::UnknownMethod { .. }) {
                    debug!(method = %request.method, "Unknown notification, ignoring");
                    return None;
                }
                error!(method = %request.method, error = %error, "Request failed");
                Some(JsonRpcResponse::rejection(request.id, &error))
            }
        }
    }
}
