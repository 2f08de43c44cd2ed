//! Tool protocol types
//!
//! Callers talk to `marksheet serve` with one JSON message per line over
//! stdin/stdout. `marksheet tools` prints the [`ToolManifest`].

use serde::{Deserialize, Serialize};

/// Manifest declaring the operations and prompts on offer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolManifest {
    /// Server name
    pub name: String,

    /// Server version
    pub version: String,

    /// Human-readable description
    pub description: String,

    /// Supported operations
    pub tools: Vec<ToolSpec>,

    /// Prompt templates
    pub prompts: Vec<PromptSpec>,
}

/// One operation and its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub required: Vec<ParamSpec>,
    pub optional: Vec<ParamSpec>,
}

/// A named parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
}

impl ParamSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// A prompt template and its arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSpec {
    pub name: String,
    pub description: String,
    pub arguments: Vec<ParamSpec>,
}

/// One message of a rendered prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// `system` or `user`
    pub role: String,
    pub content: String,
}

/// A request sent to the tool server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRequest {
    /// The operation to perform
    pub operation: String,

    /// Operation-specific parameters
    #[serde(default)]
    pub params: serde_json::Value,
}

impl ToolRequest {
    pub fn new(operation: impl Into<String>, params: impl Into<serde_json::Value>) -> Self {
        Self {
            operation: operation.into(),
            params: params.into(),
        }
    }
}

/// A response from the tool server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Whether the operation succeeded
    pub success: bool,

    /// Result data (if success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Error message (if failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error category, e.g. `marker_not_found` (if failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ToolResponse {
    pub fn success(data: impl Into<serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data.into()),
            error: None,
            kind: None,
        }
    }

    pub fn error(message: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            kind: Some(kind.into()),
        }
    }
}
