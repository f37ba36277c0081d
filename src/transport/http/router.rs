//! HTTP request routing for the streamable HTTP transport
//!
//! Endpoints:
//! - `POST /mcp` - client-to-server message delivery
//! - `GET /mcp` - server-push stream (`text/event-stream`) for one session
//! - `DELETE /mcp` - explicit session termination (idempotent)
//! - `GET /health` - liveness probe, no auth, no session
//!
//! Every `/mcp` request passes the origin/security gate before any session
//! logic runs. Session demultiplexing per request, evaluated in order:
//! continuation (valid session id), initiation (`initialize` with no id),
//! rejection (everything else — never creates a session as a side effect).

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    middleware::{self, Next},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use super::connection::TransportSession;
use super::rpc::{self, codes, ClientMessage};
use super::session::SessionRegistry;
use crate::config::Config;
use crate::invoker::ToolInvoker;

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Shared state for the HTTP transport handlers
#[derive(Clone)]
pub struct HttpState {
    pub config: Arc<Config>,
    pub registry: Arc<SessionRegistry>,
    pub connections: Arc<Mutex<HashMap<String, Arc<TransportSession>>>>,
    pub invoker: Arc<dyn ToolInvoker>,
}

impl HttpState {
    pub fn new(config: Arc<Config>, invoker: Arc<dyn ToolInvoker>) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.session_timeout));
        Self {
            config,
            registry,
            connections: Arc::new(Mutex::new(HashMap::new())),
            invoker,
        }
    }

    /// Look up the live transport session for an id; `None` if the id is
    /// unknown or the session has expired. An orphaned binding left behind by
    /// expiry is closed and dropped here.
    fn live_connection(&self, id: &str) -> Option<Arc<TransportSession>> {
        let connection = {
            let connections = self.connections.lock().expect("connections lock poisoned");
            connections.get(id).cloned()
        };
        if self.registry.get(id).is_some() {
            return connection;
        }
        if let Some(stale) = connection {
            stale.close();
            self.connections
                .lock()
                .expect("connections lock poisoned")
                .remove(id);
        }
        None
    }

    /// Drop a session binding and its registry entry. Safe to call twice.
    pub fn drop_session(&self, id: &str) {
        let connection = self
            .connections
            .lock()
            .expect("connections lock poisoned")
            .remove(id);
        if let Some(connection) = connection {
            connection.close();
        }
        self.registry.remove(id);
    }

    /// Close every binding and tear the registry down
    pub fn shutdown(&self) {
        let connections: Vec<Arc<TransportSession>> = {
            let mut map = self.connections.lock().expect("connections lock poisoned");
            map.drain().map(|(_, c)| c).collect()
        };
        for connection in connections {
            connection.close();
        }
        self.registry.teardown();
    }
}

/// Build the axum router for the streamable HTTP transport
pub fn build_router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mcp_routes = Router::new()
        .route(
            "/mcp",
            get(get_mcp).post(post_mcp).delete(delete_mcp),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_gate,
        ));

    Router::new()
        .merge(mcp_routes)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(GlobalConcurrencyLimitLayer::new(state.config.max_connections))
        .with_state(state)
}

// ----------------------------------------------------------------------
// Origin / transport-security gate
// ----------------------------------------------------------------------

/// Reject disallowed origins (and, when DNS-rebinding protection is on,
/// unexpected Host headers) before any session logic runs.
async fn security_gate(
    State(state): State<HttpState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
    {
        if !origin_allowed(origin, &state.config.allowed_origins) {
            warn!(origin, "rejected request from disallowed origin");
            return (
                StatusCode::FORBIDDEN,
                Json(rpc::error_response(
                    None,
                    codes::INVALID_REQUEST,
                    "origin not allowed",
                )),
            )
                .into_response();
        }
    }

    if state.config.dns_rebinding_protection {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok());
        let allowed = host
            .map(|h| host_allowed(h, &state.config.allowed_hosts))
            .unwrap_or(false);
        if !allowed {
            warn!(host, "rejected request with disallowed Host header");
            return (
                StatusCode::FORBIDDEN,
                Json(rpc::error_response(
                    None,
                    codes::INVALID_REQUEST,
                    "host not allowed",
                )),
            )
                .into_response();
        }
    }

    next.run(request).await
}

/// Match an Origin header against the allow-list.
///
/// Patterns are exact origins, a port wildcard (`http://localhost:*`), or a
/// single-label host wildcard (`http://*.example.com`).
pub fn origin_allowed(origin: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| origin_matches(origin, p))
}

fn origin_matches(origin: &str, pattern: &str) -> bool {
    if pattern == "*" || pattern == origin {
        return true;
    }

    // port wildcard: "http://localhost:*"
    if let Some(prefix) = pattern.strip_suffix(":*") {
        if origin == prefix {
            return true;
        }
        if let Some(rest) = origin.strip_prefix(prefix) {
            if let Some(port) = rest.strip_prefix(':') {
                return port.parse::<u16>().is_ok();
            }
        }
        return false;
    }

    // host wildcard: "http://*.example.com" (one label, ports must match)
    if let Some((scheme, host_pattern)) = pattern.split_once("://") {
        if let Some(suffix) = host_pattern.strip_prefix("*.") {
            let parsed = match url::Url::parse(origin) {
                Ok(url) => url,
                Err(_) => return false,
            };
            if parsed.scheme() != scheme {
                return false;
            }
            let (suffix_host, suffix_port) = match suffix.split_once(':') {
                Some((h, p)) => (h, p.parse::<u16>().ok()),
                None => (suffix, None),
            };
            if parsed.port() != suffix_port {
                return false;
            }
            let host = match parsed.host_str() {
                Some(host) => host,
                None => return false,
            };
            if let Some(label) = host.strip_suffix(suffix_host) {
                if let Some(label) = label.strip_suffix('.') {
                    return !label.is_empty() && !label.contains('.');
                }
            }
        }
    }

    false
}

/// Match a Host header (host or host:port) against the allowed-hosts list
pub fn host_allowed(host_header: &str, allowed: &[String]) -> bool {
    let host = host_header
        .rsplit_once(':')
        .map(|(h, _)| h)
        .unwrap_or(host_header);
    allowed
        .iter()
        .any(|a| a.eq_ignore_ascii_case(host) || a.eq_ignore_ascii_case(host_header))
}

// ----------------------------------------------------------------------
// /mcp handlers
// ----------------------------------------------------------------------

fn session_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok())
}

fn session_rejection(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(rpc::error_response(
            None,
            codes::SESSION_NOT_FOUND,
            message,
        )),
    )
        .into_response()
}

async fn post_mcp(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message: ClientMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            debug!(error = %e, "unparseable request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(rpc::error_response(
                    None,
                    codes::PARSE_ERROR,
                    format!("parse error: {e}"),
                )),
            )
                .into_response();
        }
    };

    // 1. Continuation: a session id bound to a live transport session
    if let Some(id) = session_header(&headers) {
        let Some(connection) = state.live_connection(id) else {
            return session_rejection("unknown or expired session id");
        };
        state.registry.touch(id);
        return deliver(&connection, message).await;
    }

    // 2. Initiation: no session id, and the message is the handshake
    if let ClientMessage::Request(ref request) = message {
        if request.is_initialize() {
            let id = state.registry.create();
            let connection = Arc::new(TransportSession::new(id.clone(), state.invoker.clone()));
            state
                .connections
                .lock()
                .expect("connections lock poisoned")
                .insert(id.clone(), connection.clone());
            info!(session_id = %id, "session initialized");

            let mut response = deliver(&connection, message).await;
            if let Ok(value) = header::HeaderValue::from_str(&id) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(SESSION_HEADER), value);
            }
            return response;
        }
    }

    // 3. Everything else is rejected without touching any state
    session_rejection("no valid session; send initialize first")
}

/// Route a parsed message into a transport session and shape the HTTP reply
async fn deliver(connection: &Arc<TransportSession>, message: ClientMessage) -> Response {
    match message {
        ClientMessage::Request(request) => match connection.handle_message(request).await {
            Some(response) => (http_status_for(&response), Json(response)).into_response(),
            None => StatusCode::ACCEPTED.into_response(),
        },
        // responses to server-initiated requests; this server issues none
        ClientMessage::Response { .. } => StatusCode::ACCEPTED.into_response(),
    }
}

/// HTTP status for a JSON-RPC response body.
///
/// Tool-level failures stay 200 (the JSON-RPC error is the payload); only
/// session loss and internal failures change the transport status.
fn http_status_for(response: &Value) -> StatusCode {
    match response["error"]["code"].as_i64() {
        Some(code) if code == codes::SESSION_NOT_FOUND as i64 => StatusCode::BAD_REQUEST,
        Some(code) if code == codes::INTERNAL_ERROR as i64 => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    }
}

async fn get_mcp(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let Some(id) = session_header(&headers) else {
        return session_rejection("missing session id");
    };
    let Some(connection) = state.live_connection(id) else {
        return session_rejection("unknown or expired session id");
    };
    state.registry.touch(id);

    let stream = BroadcastStream::new(connection.subscribe())
        .filter_map(|item| item.ok())
        .map(|value| Ok::<Event, Infallible>(Event::default().event("message").data(value.to_string())));

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

async fn delete_mcp(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    let Some(id) = session_header(&headers) else {
        return session_rejection("missing session id");
    };
    // idempotent: terminating an unknown or already-gone session is fine
    state.drop_session(id);
    info!(session_id = %id, "session terminated by client");
    StatusCode::NO_CONTENT.into_response()
}

// ----------------------------------------------------------------------
// /health
// ----------------------------------------------------------------------

async fn health(State(state): State<HttpState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "transport": "http",
        "activeSessions": state.registry.active_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
