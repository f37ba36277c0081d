//! MCP Server implementation
//!
//! This module defines the main MCP server that exposes TaskHub operations
//! as tools. Handler implementations are in the handlers/ module.
//!
//! The same server backs both transports: the rmcp tool router serves the
//! stdio deployment mode, and the [`ToolInvoker`] impl serves `tools/call`
//! dispatch from the streamable HTTP transport.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use serde_json::Value;
use tracing::instrument;

use crate::api::TaskHubClient;
use crate::handlers;
use crate::invoker::{descriptor, parse_params, InvokeResult, ToolDescriptor, ToolInvoker};
use crate::params::*;

/// The main TaskHub MCP Server
#[derive(Clone)]
pub struct TaskHubMcpServer {
    api: Arc<TaskHubClient>,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Task Tools
// ============================================================================

#[tool_router]
impl TaskHubMcpServer {
    #[tool(description = "List the tasks of a named project, with an optional status filter")]
    async fn get_project_tasks_by_name(
        &self,
        Parameters(params): Parameters<GetProjectTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_project_tasks_by_name(&self.api, params)
            .await
            .map_err(handlers::api_to_mcp_error)
    }

    #[tool(description = "Fetch a single task by its identifier")]
    async fn get_task_by_id(
        &self,
        Parameters(params): Parameters<GetTaskByIdParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_task_by_id(&self.api, params)
            .await
            .map_err(handlers::api_to_mcp_error)
    }

    #[tool(description = "Create a new task in a project")]
    async fn create_task(
        &self,
        Parameters(params): Parameters<CreateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::create_task(&self.api, params)
            .await
            .map_err(handlers::api_to_mcp_error)
    }

    #[tool(description = "Submit feedback on a task, with an optional 1-5 rating")]
    async fn submit_task_feedback(
        &self,
        Parameters(params): Parameters<SubmitTaskFeedbackParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::submit_task_feedback(&self.api, params)
            .await
            .map_err(handlers::api_to_mcp_error)
    }

    #[tool(description = "Fetch info about a single project")]
    async fn get_project_info(
        &self,
        Parameters(params): Parameters<GetProjectInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_project_info(&self.api, params)
            .await
            .map_err(handlers::api_to_mcp_error)
    }

    #[tool(description = "List projects visible to the authenticated user")]
    async fn list_user_projects(
        &self,
        Parameters(_): Parameters<EmptyParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::list_user_projects(&self.api)
            .await
            .map_err(handlers::api_to_mcp_error)
    }
}

// ============================================================================
// Server Initialization
// ============================================================================

impl TaskHubMcpServer {
    pub fn new(api: Arc<TaskHubClient>) -> Self {
        Self {
            api,
            tool_router: Self::tool_router(),
        }
    }
}

// ============================================================================
// Server Handler Implementation (stdio transport)
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for TaskHubMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "TaskHub MCP Server - provides tools for working with TaskHub \
                 tasks and projects: list a project's tasks, fetch or create \
                 tasks, submit task feedback, and inspect projects. Requires a \
                 TaskHub API token for authenticated operations."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Tool Invoker Implementation (HTTP transport)
// ============================================================================

#[async_trait]
impl ToolInvoker for TaskHubMcpServer {
    fn server_name(&self) -> &str {
        "taskhub-mcp"
    }

    fn list_tools(&self) -> Vec<ToolDescriptor> {
        vec![
            descriptor::<GetProjectTasksParams>(
                "get_project_tasks_by_name",
                "List the tasks of a named project, with an optional status filter",
            ),
            descriptor::<GetTaskByIdParams>(
                "get_task_by_id",
                "Fetch a single task by its identifier",
            ),
            descriptor::<CreateTaskParams>("create_task", "Create a new task in a project"),
            descriptor::<SubmitTaskFeedbackParams>(
                "submit_task_feedback",
                "Submit feedback on a task, with an optional 1-5 rating",
            ),
            descriptor::<GetProjectInfoParams>(
                "get_project_info",
                "Fetch info about a single project",
            ),
            descriptor::<EmptyParams>(
                "list_user_projects",
                "List projects visible to the authenticated user",
            ),
        ]
    }

    #[instrument(skip(self, arguments), fields(tool = name))]
    async fn invoke(&self, name: &str, arguments: Value) -> InvokeResult<CallToolResult> {
        match name {
            "get_project_tasks_by_name" => {
                let params = parse_params(arguments)?;
                Ok(handlers::get_project_tasks_by_name(&self.api, params).await?)
            }
            "get_task_by_id" => {
                let params = parse_params(arguments)?;
                Ok(handlers::get_task_by_id(&self.api, params).await?)
            }
            "create_task" => {
                let params = parse_params(arguments)?;
                Ok(handlers::create_task(&self.api, params).await?)
            }
            "submit_task_feedback" => {
                let params = parse_params(arguments)?;
                Ok(handlers::submit_task_feedback(&self.api, params).await?)
            }
            "get_project_info" => {
                let params = parse_params(arguments)?;
                Ok(handlers::get_project_info(&self.api, params).await?)
            }
            "list_user_projects" => Ok(handlers::list_user_projects(&self.api).await?),
            other => Err(crate::invoker::InvokeError::UnknownTool(other.to_string())),
        }
    }
}
