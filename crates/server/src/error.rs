//! Tool-layer errors for the waypost server.
//!
//! Failures from the interception pipeline use `waypost_core::Error`; these
//! cover argument problems the tools detect themselves.

use rmcp::model::{ErrorCode, ErrorData as McpError};

/// Structured errors raised by tool argument handling.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Invalid input parameters (e.g., neither `max_entries` nor `delete`).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The named region does not exist in the store.
    #[error("UNKNOWN_REGION: {0}")]
    UnknownRegion(String),

    /// Tool output could not be encoded.
    #[error("OUTPUT_FAILED: {0}")]
    Output(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidInput(_) => (-32602, err.to_string()),
            ToolError::UnknownRegion(_) => (-32004, err.to_string()),
            ToolError::Output(_) => (-32000, err.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Output(err.to_string())
    }
}
