//! Task handler implementations

use rmcp::model::CallToolResult;

use crate::api::{ApiError, ApiResult, CreateTaskRequest, FeedbackRequest, TaskHubClient};
use crate::params::{
    CreateTaskParams, GetProjectTasksParams, GetTaskByIdParams, SubmitTaskFeedbackParams,
};

use super::json_success;

/// List the tasks of a named project, optionally filtered by status
pub async fn get_project_tasks_by_name(
    api: &TaskHubClient,
    params: GetProjectTasksParams,
) -> ApiResult<CallToolResult> {
    if params.project_name.trim().is_empty() {
        return Err(ApiError::Validation("project_name must not be empty".into()));
    }

    let tasks = api
        .project_tasks_by_name(&params.project_name, params.status.as_deref())
        .await?;
    json_success(&tasks)
}

/// Fetch a single task by id
pub async fn get_task_by_id(
    api: &TaskHubClient,
    params: GetTaskByIdParams,
) -> ApiResult<CallToolResult> {
    if params.task_id.trim().is_empty() {
        return Err(ApiError::Validation("task_id must not be empty".into()));
    }

    let task = api.get_task(&params.task_id).await?;
    json_success(&task)
}

/// Create a new task in a project
pub async fn create_task(
    api: &TaskHubClient,
    params: CreateTaskParams,
) -> ApiResult<CallToolResult> {
    if params.project_id.trim().is_empty() {
        return Err(ApiError::Validation("project_id must not be empty".into()));
    }
    if params.title.trim().is_empty() {
        return Err(ApiError::Validation("title must not be empty".into()));
    }

    let request = CreateTaskRequest {
        project_id: params.project_id,
        title: params.title,
        description: params.description,
        priority: params.priority,
        labels: params.labels,
    };
    let task = api.create_task(&request).await?;
    json_success(&task)
}

/// Submit feedback on a task
pub async fn submit_task_feedback(
    api: &TaskHubClient,
    params: SubmitTaskFeedbackParams,
) -> ApiResult<CallToolResult> {
    if params.task_id.trim().is_empty() {
        return Err(ApiError::Validation("task_id must not be empty".into()));
    }
    if params.feedback.trim().is_empty() {
        return Err(ApiError::Validation("feedback must not be empty".into()));
    }
    if let Some(rating) = params.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::Validation(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
    }

    let request = FeedbackRequest {
        feedback: params.feedback,
        rating: params.rating,
    };
    let ack = api.submit_feedback(&params.task_id, &request).await?;
    json_success(&ack)
}
