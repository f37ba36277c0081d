//! JSON-RPC framing for the streamable HTTP transport
//!
//! Wire types and response builders only; no dispatch logic lives here.
//! Rejected requests always answer with `id: null`.

use serde::Deserialize;
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revision this transport implements
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// JSON-RPC error codes used on this transport
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// Missing, unknown, or expired session id
    pub const SESSION_NOT_FOUND: i32 = -32000;
    /// Credential missing or rejected by the backend
    pub const AUTHENTICATION_ERROR: i32 = -32001;
    /// Remote entity absent
    pub const RESOURCE_NOT_FOUND: i32 = -32002;
    /// Backend unreachable after bounded retry
    pub const UPSTREAM_UNAVAILABLE: i32 = -32003;
}

/// An inbound JSON-RPC request or notification
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no id and expect no response
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Whether this is the session-initiating handshake
    pub fn is_initialize(&self) -> bool {
        self.method == "initialize"
    }
}

/// Any message a client may POST: a request/notification, or a response to a
/// server-initiated request (accepted and dropped; this server issues none).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClientMessage {
    Request(JsonRpcRequest),
    Response {
        id: Value,
        #[serde(default)]
        result: Option<Value>,
        #[serde(default)]
        error: Option<Value>,
    },
}

/// Build a success response for a request id
pub fn result_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id,
        "result": result,
    })
}

/// Build an error response; `id: null` when the request never got far enough
/// to have one.
pub fn error_response(id: Option<Value>, code: i32, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "error": {
            "code": code,
            "message": message.into(),
        },
        "id": id.unwrap_or(Value::Null),
    })
}

/// Build a server-to-client notification
pub fn notification(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "method": method,
        "params": params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_request() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Request(req) => {
                assert_eq!(req.method, "tools/list");
                assert!(!req.is_notification());
                assert!(!req.is_initialize());
            }
            ClientMessage::Response { .. } => panic!("parsed as response"),
        }
    }

    #[test]
    fn parses_a_notification() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Request(req) => assert!(req.is_notification()),
            ClientMessage::Response { .. } => panic!("parsed as response"),
        }
    }

    #[test]
    fn parses_a_client_response() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"result":{}}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Response { .. }));
    }

    #[test]
    fn rejected_requests_answer_with_null_id() {
        let value = error_response(None, codes::SESSION_NOT_FOUND, "no valid session");
        assert_eq!(value["id"], Value::Null);
        assert_eq!(value["error"]["code"], codes::SESSION_NOT_FOUND);
        assert_eq!(value["jsonrpc"], "2.0");
    }

    #[test]
    fn result_response_echoes_the_request_id() {
        let value = result_response(json!(42), json!({"ok": true}));
        assert_eq!(value["id"], 42);
        assert_eq!(value["result"]["ok"], true);
    }
}
