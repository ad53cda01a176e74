//! Error type for the MCP tool server.
//!
//! Tool failures are never fatal: they are serialized into the structured
//! `{success: false, error}` payload the transport returns, except for the
//! unknown-tool case which maps to a protocol-level error.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Tool server error with a status-like code and optional context.
#[derive(Debug, Error, Serialize, Deserialize, Clone)]
#[error("{message}")]
pub struct Error {
    /// HTTP status-like code (e.g., 400, 404, 502).
    pub code: i32,

    /// Human-readable error message.
    pub message: String,

    /// Machine-readable problem type URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// Additional error context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl Error {
    /// Create a new error with a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            r#type: None,
            context: None,
        }
    }

    /// Add a problem type URI.
    pub fn with_type(mut self, type_uri: impl Into<String>) -> Self {
        self.r#type = Some(type_uri.into());
        self
    }

    /// Add context information as JSON.
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Unrecognized tool name.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(404, format!("Unknown tool: {name}"))
            .with_type("https://panaride.local/errors/unknown-tool")
            .with_context(json!({ "tool": name }))
    }

    /// Malformed or missing tool arguments.
    pub fn invalid_params(reason: impl Into<String>) -> Self {
        Self::new(400, format!("Invalid tool arguments: {}", reason.into()))
            .with_type("https://panaride.local/errors/invalid-parameters")
    }

    /// Failure reported by the collection store or another upstream.
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::new(502, err.to_string())
            .with_type("https://panaride.local/errors/upstream-data-error")
    }

    /// Internal server error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::new(500, format!("Internal server error: {}", reason.into()))
            .with_type("https://panaride.local/errors/internal-error")
    }

    /// Whether this error identifies an unrecognized tool, which the
    /// transport reports as a protocol-level "method not found".
    pub fn is_unknown_tool(&self) -> bool {
        self.r#type.as_deref() == Some("https://panaride.local/errors/unknown-tool")
    }
}
