//! Handler implementations for TaskHub MCP tools
//!
//! Organized by domain: task, project. Handlers validate arguments, call the
//! API client, and wrap the serialized result as a single text content block.

mod project;
mod task;

pub use project::*;
pub use task::*;

use rmcp::model::{CallToolResult, Content};
use rmcp::ErrorData as McpError;
use serde::Serialize;

use crate::api::ApiError;

/// Convert an ApiError to an MCP error for the stdio tool router
pub fn api_to_mcp_error(e: ApiError) -> McpError {
    match e {
        ApiError::Validation(_) => McpError::invalid_params(e.to_string(), None),
        _ => McpError::internal_error(e.to_string(), None),
    }
}

/// Wrap serializable data as a successful tool result with one text block
pub(crate) fn json_success<T: Serialize>(data: &T) -> Result<CallToolResult, ApiError> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| ApiError::Unknown(format!("failed to serialize result: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
