//! TaskHub API client
//!
//! Thin pass-through client for the remote TaskHub HTTP API with bearer-token
//! auth, bounded exponential retry on transient failures, and a global
//! minimum spacing between outbound calls.

mod client;
mod error;
mod types;

pub use client::TaskHubClient;
pub use error::{ApiError, ApiResult};
pub use types::{CreateTaskRequest, FeedbackAck, FeedbackRequest, Project, Task};
