//! End-to-end tests for the streamable HTTP transport
//!
//! Each test serves the real router on an ephemeral port and talks to it
//! over the wire. A stub TaskHub backend stands in for the remote API where
//! a tool call needs one.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Path, routing::get, Json, Router};
use serde_json::{json, Value};

use taskhub_mcp::api::TaskHubClient;
use taskhub_mcp::config::Config;
use taskhub_mcp::server::TaskHubMcpServer;
use taskhub_mcp::transport::http::router::{build_router, HttpState, SESSION_HEADER};

async fn spawn_stub_backend() -> SocketAddr {
    let app = Router::new().route(
        "/api/v1/tasks/:id",
        get(|Path(id): Path<String>| async move {
            Json(json!({
                "id": id,
                "title": "Fix login flow",
                "status": "open",
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_mcp_server(mut config: Config) -> SocketAddr {
    // skip outbound pacing in tests
    config.min_call_spacing = Duration::ZERO;
    let config = Arc::new(config);
    let api = Arc::new(TaskHubClient::new(&config).unwrap());
    let server = TaskHubMcpServer::new(api);
    let state = HttpState::new(config, Arc::new(server));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn initialize_message() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "0.0.0"},
        },
    })
}

async fn open_session(client: &reqwest::Client, addr: SocketAddr) -> String {
    let response = client
        .post(format!("http://{addr}/mcp"))
        .json(&initialize_message())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    response
        .headers()
        .get(SESSION_HEADER)
        .expect("initialize response must carry a session id")
        .to_str()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn initialize_yields_exactly_one_session_id() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/mcp"))
        .json(&initialize_message())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let session_id = response
        .headers()
        .get(SESSION_HEADER)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["protocolVersion"], "2025-03-26");
    assert_eq!(body["result"]["serverInfo"]["name"], "taskhub-mcp");

    // exactly one registry entry
    let health: Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["activeSessions"], 1);
    assert!(!session_id.is_empty());
}

#[tokio::test]
async fn tools_list_returns_the_six_tools() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &session_id)
        .json(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let tools = body["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 6);

    let names: Vec<&str> = tools
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    for expected in [
        "get_project_tasks_by_name",
        "get_task_by_id",
        "submit_task_feedback",
        "create_task",
        "get_project_info",
        "list_user_projects",
    ] {
        assert!(names.contains(&expected), "missing tool {expected}");
    }
}

#[tokio::test]
async fn unknown_session_id_is_rejected_without_creating_one() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, uuid::Uuid::new_v4().to_string())
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32000);
    assert_eq!(body["id"], Value::Null);

    let health: Value = client
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["activeSessions"], 0);
}

#[tokio::test]
async fn non_initialize_without_session_id_is_rejected() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/mcp"))
        .json(&json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32000);
}

#[tokio::test]
async fn unparseable_body_answers_parse_error() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn expired_session_is_rejected() {
    let mut config = Config::default();
    config.session_timeout = Duration::from_millis(200);
    let addr = spawn_mcp_server(config).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    tokio::time::sleep(Duration::from_millis(350)).await;

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &session_id)
        .json(&json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32000);
}

#[tokio::test]
async fn activity_slides_the_session_window() {
    let mut config = Config::default();
    config.session_timeout = Duration::from_millis(300);
    let addr = spawn_mcp_server(config).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    // keep touching below the timeout; the session must stay alive past it
    for i in 0..4 {
        tokio::time::sleep(Duration::from_millis(150)).await;
        let response = client
            .post(format!("http://{addr}/mcp"))
            .header(SESSION_HEADER, &session_id)
            .json(&json!({"jsonrpc": "2.0", "id": i + 10, "method": "ping"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }
}

#[tokio::test]
async fn sessions_are_independent() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();
    let first = open_session(&client, addr).await;
    let second = open_session(&client, addr).await;
    assert_ne!(first, second);

    let request = |session_id: String| {
        let client = client.clone();
        async move {
            client
                .post(format!("http://{addr}/mcp"))
                .header(SESSION_HEADER, &session_id)
                .json(&json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}))
                .send()
                .await
                .unwrap()
        }
    };
    let (a, b) = tokio::join!(request(first.clone()), request(second.clone()));
    assert_eq!(a.status(), 200);
    assert_eq!(b.status(), 200);

    // terminating one session leaves the other routable
    let response = client
        .delete(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &first)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &second)
        .json(&json!({"jsonrpc": "2.0", "id": 4, "method": "ping"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn delete_is_idempotent() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    for _ in 0..2 {
        let response = client
            .delete(format!("http://{addr}/mcp"))
            .header(SESSION_HEADER, &session_id)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);
    }

    // terminating a session that never existed is not an error either
    let response = client
        .delete(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, uuid::Uuid::new_v4().to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // but the id no longer routes
    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &session_id)
        .json(&json!({"jsonrpc": "2.0", "id": 5, "method": "ping"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn health_reports_live_session_count() {
    let mut config = Config::default();
    config.session_timeout = Duration::from_millis(250);
    let addr = spawn_mcp_server(config).await;
    let client = reqwest::Client::new();

    let health_count = || async {
        let health: Value = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["transport"], "http");
        assert!(health["timestamp"].is_string());
        health["activeSessions"].as_u64().unwrap()
    };

    assert_eq!(health_count().await, 0);
    let _first = open_session(&client, addr).await;
    let _second = open_session(&client, addr).await;
    assert_eq!(health_count().await, 2);

    // expired sessions drop out of the count
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(health_count().await, 0);
}

#[tokio::test]
async fn origin_gate_blocks_unlisted_origins() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header("origin", "http://evil.com")
        .json(&initialize_message())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // wildcard pattern http://localhost:* admits any localhost port
    let response = client
        .post(format!("http://{addr}/mcp"))
        .header("origin", "http://localhost:5173")
        .json(&initialize_message())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn dns_rebinding_protection_checks_the_host_header() {
    let mut config = Config::default();
    config.dns_rebinding_protection = true;
    config.allowed_hosts = vec!["localhost".to_string()];
    let addr = spawn_mcp_server(config).await;
    let client = reqwest::Client::new();

    // reqwest sends Host: 127.0.0.1:<port>, which is not in the allow-list
    let response = client
        .post(format!("http://{addr}/mcp"))
        .json(&initialize_message())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn get_opens_a_server_push_stream() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    let response = client
        .get(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &session_id)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.starts_with("text/event-stream"));

    // without a session id the stream is refused
    let response = client.get(format!("http://{addr}/mcp")).send().await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn tool_call_round_trips_through_the_backend() {
    let backend = spawn_stub_backend().await;
    let mut config = Config::default();
    config.api_url = format!("http://{backend}");
    let addr = spawn_mcp_server(config).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &session_id)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 9,
            "method": "tools/call",
            "params": {"name": "get_task_by_id", "arguments": {"task_id": "t-42"}},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], 9);
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("Fix login flow"));
    assert_ne!(body["result"]["isError"], true);
}

#[tokio::test]
async fn tool_call_with_malformed_arguments_fails_fast() {
    let mut config = Config::default();
    // unroutable backend: a request would hang or error, validation must win first
    config.api_url = "http://192.0.2.1".to_string();
    let addr = spawn_mcp_server(config).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &session_id)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 10,
            "method": "tools/call",
            "params": {"name": "get_task_by_id", "arguments": {"task_id": 42}},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32602);
}

#[tokio::test]
async fn notifications_are_accepted_without_a_response_body() {
    let addr = spawn_mcp_server(Config::default()).await;
    let client = reqwest::Client::new();
    let session_id = open_session(&client, addr).await;

    let response = client
        .post(format!("http://{addr}/mcp"))
        .header(SESSION_HEADER, &session_id)
        .json(&json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 202);
}
