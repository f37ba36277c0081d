//! TaskHub MCP Library
//!
//! MCP-compatible tools for the TaskHub task management API.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use taskhub_mcp::{Config, TaskHubClient, TaskHubMcpServer};
//!
//! let config = Config::default();
//! let api = Arc::new(TaskHubClient::new(&config)?);
//! let server = TaskHubMcpServer::new(api);
//! // Serve via stdio, or mount the streamable HTTP transport
//! ```
//!
//! # Tools
//! - Tasks: list by project name, fetch by id, create, submit feedback
//! - Projects: info, list for the authenticated user
//!
//! # Transports
//! - `stdio` - rmcp service over stdin/stdout
//! - `http` - streamable HTTP (`POST`/`GET`/`DELETE /mcp`) with session management

pub mod api;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod invoker;
pub mod logging;
pub mod params;
pub mod server;
pub mod transport;

// Re-export main entry points
pub use api::TaskHubClient;
pub use config::Config;
pub use invoker::{InvokeError, ToolDescriptor, ToolInvoker};
pub use server::TaskHubMcpServer;

// Re-export parameter types for direct API usage
pub use params::*;
