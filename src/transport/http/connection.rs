//! Transport session: the live duplex binding for one session
//!
//! A [`TransportSession`] owns the per-session message handling: JSON-RPC
//! dispatch of protocol methods, tool-call bookkeeping, and the long-lived
//! server-push channel that backs the session's SSE stream. Responses are
//! correlated to requests by JSON-RPC id; in-flight tool calls are tracked in
//! a map keyed by that id, so concurrent calls within one session never
//! share positional state.
//!
//! Closing is idempotent. A tool call that outlives its session completes
//! normally, its result is discarded, and the caller receives a session
//! error instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde_json::{json, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::rpc::{self, codes, JsonRpcRequest};
use crate::api::ApiError;
use crate::invoker::{InvokeError, ToolInvoker};

const NOTIFICATION_BUFFER: usize = 64;

/// A single in-flight tool invocation, kept for logging correlation only
#[derive(Debug, Clone)]
pub struct PendingToolCall {
    pub tool: String,
    pub session_id: String,
    pub started: Instant,
}

/// Live duplex binding for one session
pub struct TransportSession {
    session_id: String,
    invoker: Arc<dyn ToolInvoker>,
    notifications: broadcast::Sender<Value>,
    pending: Mutex<HashMap<String, PendingToolCall>>,
    closed: AtomicBool,
}

impl TransportSession {
    pub fn new(session_id: String, invoker: Arc<dyn ToolInvoker>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);
        Self {
            session_id,
            invoker,
            notifications,
            pending: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Subscribe to the server-push stream for this session.
    ///
    /// The stream is independent of any request/response pair and stays open
    /// until the session closes.
    pub fn subscribe(&self) -> broadcast::Receiver<Value> {
        self.notifications.subscribe()
    }

    /// Push a notification to every open stream for this session.
    ///
    /// Best effort: with no subscriber the message is dropped.
    pub fn notify(&self, method: &str, params: Value) {
        let _ = self.notifications.send(rpc::notification(method, params));
    }

    /// Number of in-flight tool calls
    pub fn pending_calls(&self) -> usize {
        self.pending.lock().expect("pending lock poisoned").len()
    }

    /// Close the session binding. Idempotent; only the first call does work.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let dropped = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            let count = pending.len();
            pending.clear();
            count
        };
        if dropped > 0 {
            debug!(
                session_id = %self.session_id,
                in_flight = dropped,
                "session closed with tool calls in flight"
            );
        }
    }

    /// Handle one routed message. Returns the response to deliver, or `None`
    /// for notifications and client responses.
    pub async fn handle_message(&self, request: JsonRpcRequest) -> Option<Value> {
        if request.is_notification() {
            debug!(
                session_id = %self.session_id,
                method = %request.method,
                "notification received"
            );
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let response = match request.method.as_str() {
            "initialize" => rpc::result_response(id, self.initialize_result()),
            "ping" => rpc::result_response(id, json!({})),
            "tools/list" => {
                let tools = self.invoker.list_tools();
                rpc::result_response(id, json!({ "tools": tools }))
            }
            "tools/call" => self.handle_tool_call(id, request.params).await,
            other => rpc::error_response(
                Some(id),
                codes::METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            ),
        };
        Some(response)
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": rpc::PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": self.invoker.server_name(),
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    async fn handle_tool_call(&self, id: Value, params: Option<Value>) -> Value {
        let params = params.unwrap_or(Value::Null);
        let name = match params.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                return rpc::error_response(
                    Some(id),
                    codes::INVALID_PARAMS,
                    "tools/call requires a string 'name'",
                )
            }
        };
        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        let call_key = id.to_string();
        {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            pending.insert(
                call_key.clone(),
                PendingToolCall {
                    tool: name.clone(),
                    session_id: self.session_id.clone(),
                    started: Instant::now(),
                },
            );
        }

        let outcome = self.invoker.invoke(&name, arguments).await;

        let finished = {
            let mut pending = self.pending.lock().expect("pending lock poisoned");
            pending.remove(&call_key)
        };
        let elapsed_ms = finished
            .as_ref()
            .map(|call| call.started.elapsed().as_millis() as u64);

        if self.is_closed() {
            debug!(
                session_id = %self.session_id,
                tool = %name,
                "session closed during tool call, discarding result"
            );
            return rpc::error_response(
                Some(id),
                codes::SESSION_NOT_FOUND,
                "session closed while the call was in flight",
            );
        }

        match outcome {
            Ok(result) => {
                if let Some(call) = &finished {
                    debug!(
                        session_id = %call.session_id,
                        tool = %call.tool,
                        elapsed_ms,
                        "tool call completed"
                    );
                }
                match serde_json::to_value(&result) {
                    Ok(value) => rpc::result_response(id, value),
                    Err(e) => rpc::error_response(
                        Some(id),
                        codes::INTERNAL_ERROR,
                        format!("failed to serialize tool result: {e}"),
                    ),
                }
            }
            Err(error) => {
                warn!(
                    session_id = %self.session_id,
                    tool = %name,
                    elapsed_ms,
                    error = %error,
                    "tool call failed"
                );
                self.notify(
                    "notifications/message",
                    json!({
                        "level": "warning",
                        "logger": "taskhub-mcp",
                        "data": format!("tool {name} failed: {error}"),
                    }),
                );
                rpc::error_response(Some(id), invoke_error_code(&error), error.to_string())
            }
        }
    }
}

/// Map an invocation failure to its JSON-RPC error code
fn invoke_error_code(error: &InvokeError) -> i32 {
    match error {
        InvokeError::UnknownTool(_) => codes::INVALID_PARAMS,
        InvokeError::InvalidParams(_) => codes::INVALID_PARAMS,
        InvokeError::Api(ApiError::Validation(_)) => codes::INVALID_PARAMS,
        InvokeError::Api(ApiError::Authentication(_)) => codes::AUTHENTICATION_ERROR,
        InvokeError::Api(ApiError::NotFound(_)) => codes::RESOURCE_NOT_FOUND,
        InvokeError::Api(ApiError::Connection(_)) => codes::UPSTREAM_UNAVAILABLE,
        InvokeError::Api(ApiError::Unknown(_)) => codes::INTERNAL_ERROR,
    }
}
