//! Async client for the TaskHub REST API
//!
//! All tool handlers go through this client. Transient failures (network
//! errors, 408/429/5xx) are retried with capped exponential backoff; every
//! other failure is surfaced immediately. A global minimum spacing between
//! outbound calls protects the backend from bursts without blocking inbound
//! request routing.

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::error::{ApiError, ApiResult};
use super::types::{CreateTaskRequest, FeedbackAck, FeedbackRequest, Project, Task};
use crate::config::Config;

const MAX_REMOTE_MESSAGE_LEN: usize = 200;

/// TaskHub API client
pub struct TaskHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    max_retries: u32,
    retry_base_delay: Duration,
    min_call_spacing: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl TaskHubClient {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("taskhub-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
            min_call_spacing: config.min_call_spacing,
            last_dispatch: Mutex::new(None),
        })
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// List projects visible to the authenticated user
    pub async fn list_projects(&self) -> ApiResult<Vec<Project>> {
        self.get_json("/projects", &[]).await
    }

    /// Fetch a single project
    pub async fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        self.get_json(&format!("/projects/{project_id}"), &[]).await
    }

    /// List tasks in the project with the given name
    pub async fn project_tasks_by_name(
        &self,
        project_name: &str,
        status: Option<&str>,
    ) -> ApiResult<Vec<Task>> {
        let mut query = vec![("project_name", project_name)];
        if let Some(status) = status {
            query.push(("status", status));
        }
        self.get_json("/projects/tasks", &query).await
    }

    /// Fetch a single task
    pub async fn get_task(&self, task_id: &str) -> ApiResult<Task> {
        self.get_json(&format!("/tasks/{task_id}"), &[]).await
    }

    /// Create a task
    pub async fn create_task(&self, request: &CreateTaskRequest) -> ApiResult<Task> {
        self.post_json("/tasks", request).await
    }

    /// Submit feedback on a task
    pub async fn submit_feedback(
        &self,
        task_id: &str,
        request: &FeedbackRequest,
    ) -> ApiResult<FeedbackAck> {
        self.post_json(&format!("/tasks/{task_id}/feedback"), request)
            .await
    }

    // ------------------------------------------------------------------
    // Transport plumbing
    // ------------------------------------------------------------------

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = self.endpoint(path);
        debug!(path, "GET TaskHub API");
        let response = self
            .send_with_retry(|| {
                let mut request = self.http.get(&url).query(&query);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                request
            })
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Unknown(format!("malformed response body: {e}")))
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let url = self.endpoint(path);
        debug!(path, "POST TaskHub API");
        let response = self
            .send_with_retry(|| {
                let mut request = self.http.post(&url).json(body);
                if let Some(token) = &self.token {
                    request = request.bearer_auth(token);
                }
                request
            })
            .await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Unknown(format!("malformed response body: {e}")))
    }

    /// Send a request, retrying transient failures with exponential backoff.
    ///
    /// The builder closure is invoked once per attempt so retries never reuse
    /// a consumed request.
    async fn send_with_retry(
        &self,
        make_request: impl Fn() -> reqwest::RequestBuilder,
    ) -> ApiResult<reqwest::Response> {
        let mut delay = self.retry_base_delay;
        let mut attempt: u32 = 0;
        loop {
            self.pace().await;
            let error = match make_request().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    let message = Self::remote_message(response).await;
                    ApiError::from_status(status.as_u16(), message)
                }
                Err(err) if err.is_connect() || err.is_timeout() => {
                    ApiError::Connection(err.without_url().to_string())
                }
                Err(err) => ApiError::Unknown(err.without_url().to_string()),
            };

            if error.is_retryable() && attempt < self.max_retries {
                attempt += 1;
                warn!(
                    attempt,
                    max_retries = self.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying TaskHub API call"
                );
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                continue;
            }
            return Err(error);
        }
    }

    /// Enforce the minimum spacing between outbound calls.
    ///
    /// Serializes outbound dispatch only; inbound routing never waits here.
    async fn pace(&self) {
        if self.min_call_spacing.is_zero() {
            return;
        }
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_call_spacing {
                tokio::time::sleep(self.min_call_spacing - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Extract a safe error message from a non-success response body
    async fn remote_message(response: reqwest::Response) -> String {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(text);
        let message = message.trim();
        if message.is_empty() {
            return "no error detail".to_string();
        }
        message.chars().take(MAX_REMOTE_MESSAGE_LEN).collect()
    }
}
