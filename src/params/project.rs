//! Project-related parameter types

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for fetching project info
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetProjectInfoParams {
    #[schemars(description = "Project identifier")]
    pub project_id: String,
}
