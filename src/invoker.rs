//! Tool Invoker boundary
//!
//! The [`ToolInvoker`] trait is what the transports consume: execute a named
//! tool with JSON arguments and get back a result or a structured error. The
//! stdio transport reaches the same handlers through the rmcp tool router;
//! the HTTP transport dispatches `tools/call` through this trait, which keeps
//! the session layer free of any knowledge of the tool set.

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::ApiError;

/// Error type for tool invocation
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// Tool name is not in the server's tool set
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments failed validation against the tool's parameter shape
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// The underlying API call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Result type for tool invocation
pub type InvokeResult<T> = Result<T, InvokeError>;

/// Description of one tool, as advertised in `tools/list`
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Trait for executing tools without going through an MCP transport
///
/// Implementations must be `Send + Sync`; the HTTP transport calls
/// [`ToolInvoker::invoke`] concurrently from multiple sessions.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Server name for protocol handshakes and logging
    fn server_name(&self) -> &str;

    /// All tools this server exposes
    fn list_tools(&self) -> Vec<ToolDescriptor>;

    /// Execute a tool by name with the given JSON arguments.
    ///
    /// Arguments are validated against the tool's parameter shape before any
    /// network I/O happens; malformed input fails fast with
    /// [`InvokeError::InvalidParams`].
    async fn invoke(&self, name: &str, arguments: Value) -> InvokeResult<CallToolResult>;
}

/// Build a descriptor from a schemars-documented parameter type
pub(crate) fn descriptor<T: JsonSchema>(name: &str, description: &str) -> ToolDescriptor {
    let schema = schemars::schema_for!(T);
    ToolDescriptor {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::to_value(schema)
            .unwrap_or_else(|_| Value::Object(Default::default())),
    }
}

/// Deserialize tool arguments into a typed parameter struct
pub(crate) fn parse_params<T: DeserializeOwned>(arguments: Value) -> InvokeResult<T> {
    serde_json::from_value(arguments).map_err(|e| InvokeError::InvalidParams(e.to_string()))
}
