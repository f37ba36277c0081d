//! CLI argument definitions
//!
//! Every flag has an environment-variable fallback; precedence is
//! CLI args > environment > built-in defaults. The parsed arguments
//! are turned into a validated [`Config`](crate::config::Config) in
//! `Config::from_cli`.

use clap::Parser;

use crate::transport::TransportKind;

#[derive(Parser, Debug)]
#[command(name = "taskhub-mcp", version)]
#[command(about = "MCP server for the TaskHub task management API")]
pub struct Cli {
    /// Base URL of the TaskHub API
    #[arg(long, env = "TASKHUB_API_URL", default_value = "https://api.taskhub.io")]
    pub api_url: String,

    /// Bearer token for the TaskHub API
    #[arg(long, env = "TASKHUB_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Per-request timeout for TaskHub API calls, in seconds
    #[arg(long, env = "TASKHUB_REQUEST_TIMEOUT", default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error). Overrides RUST_LOG for this crate.
    #[arg(long, env = "TASKHUB_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Transport to serve (stdio or http)
    #[arg(long, env = "TASKHUB_TRANSPORT", value_enum, default_value = "stdio")]
    pub transport: TransportKind,

    /// Host to bind the HTTP transport to
    #[arg(long, env = "TASKHUB_HTTP_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the HTTP transport to
    #[arg(long, env = "TASKHUB_HTTP_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Idle timeout after which an HTTP session expires, in seconds (minimum 10)
    #[arg(long, env = "TASKHUB_SESSION_TIMEOUT", default_value_t = 300)]
    pub session_timeout_secs: u64,

    /// Allowed Origin header values for HTTP requests.
    /// Exact matches or single-level wildcards (e.g. "http://localhost:*").
    #[arg(long, env = "TASKHUB_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Allowed Host header values when DNS-rebinding protection is on
    #[arg(long, env = "TASKHUB_ALLOWED_HOSTS", value_delimiter = ',')]
    pub allowed_hosts: Vec<String>,

    /// Reject HTTP requests whose Host header is not in the allowed-hosts list
    #[arg(long, env = "TASKHUB_DNS_REBINDING_PROTECTION", default_value_t = false)]
    pub dns_rebinding_protection: bool,

    /// Maximum concurrent HTTP connections
    #[arg(long, env = "TASKHUB_MAX_CONNECTIONS", default_value_t = 128)]
    pub max_connections: usize,

    /// Maximum retries after a failed TaskHub API call (network/5xx only)
    #[arg(long, env = "TASKHUB_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Initial retry backoff delay in milliseconds (doubles per attempt)
    #[arg(long, env = "TASKHUB_RETRY_BASE_DELAY_MS", default_value_t = 1000)]
    pub retry_base_delay_ms: u64,

    /// Minimum spacing between outbound TaskHub API calls, in milliseconds
    #[arg(long, env = "TASKHUB_MIN_CALL_SPACING_MS", default_value_t = 100)]
    pub min_call_spacing_ms: u64,
}
