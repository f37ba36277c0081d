//! Project handler implementations

use rmcp::model::CallToolResult;

use crate::api::{ApiError, ApiResult, TaskHubClient};
use crate::params::GetProjectInfoParams;

use super::json_success;

/// Fetch info about a single project
pub async fn get_project_info(
    api: &TaskHubClient,
    params: GetProjectInfoParams,
) -> ApiResult<CallToolResult> {
    if params.project_id.trim().is_empty() {
        return Err(ApiError::Validation("project_id must not be empty".into()));
    }

    let project = api.get_project(&params.project_id).await?;
    json_success(&project)
}

/// List projects visible to the authenticated user
pub async fn list_user_projects(api: &TaskHubClient) -> ApiResult<CallToolResult> {
    let projects = api.list_projects().await?;
    json_success(&projects)
}
