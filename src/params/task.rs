//! Task-related parameter types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for listing the tasks of a named project
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetProjectTasksParams {
    #[schemars(description = "Name of the project whose tasks to list")]
    pub project_name: String,

    #[schemars(description = "Filter by task status (e.g. 'open', 'in_progress', 'done')")]
    pub status: Option<String>,
}

/// Parameters for fetching a single task
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTaskByIdParams {
    #[schemars(description = "Task identifier")]
    pub task_id: String,
}

/// Parameters for creating a task
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    #[schemars(description = "Identifier of the project the task belongs to")]
    pub project_id: String,

    #[schemars(description = "Title for the new task")]
    pub title: String,

    #[schemars(description = "Description for the new task (markdown supported)")]
    pub description: Option<String>,

    #[schemars(description = "Priority (e.g. 'low', 'medium', 'high', 'urgent')")]
    pub priority: Option<String>,

    #[schemars(description = "Labels to attach to the task")]
    pub labels: Option<Vec<String>>,
}

/// Parameters for submitting feedback on a task
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SubmitTaskFeedbackParams {
    #[schemars(description = "Task identifier the feedback applies to")]
    pub task_id: String,

    #[schemars(description = "Feedback text (markdown supported)")]
    pub feedback: String,

    #[schemars(description = "Optional rating from 1 (poor) to 5 (excellent)")]
    pub rating: Option<i32>,
}
