//! Transport selection and lifecycle
//!
//! Transport is an explicit deployment choice: exactly one of `stdio` or
//! `http` is active per process, selected by configuration and constructed
//! through [`build_transport`]. There is no auto-detection.

pub mod http;
pub mod stdio;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::server::TaskHubMcpServer;

/// Which transport a process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportKind {
    /// MCP over stdin/stdout
    Stdio,
    /// Streamable HTTP with session management
    Http,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stdio => write!(f, "stdio"),
            TransportKind::Http => write!(f, "http"),
        }
    }
}

/// A running transport: serves until the client disconnects or [`Transport::stop`]
/// is called.
#[async_trait]
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Serve to completion. Resolves after a graceful shutdown.
    async fn start(self: Arc<Self>) -> anyhow::Result<()>;

    /// Request a graceful shutdown of a running [`Transport::start`] call.
    fn stop(&self);
}

/// Construct the configured transport
pub fn build_transport(config: Arc<Config>, server: TaskHubMcpServer) -> Arc<dyn Transport> {
    match config.transport {
        TransportKind::Stdio => Arc::new(stdio::StdioTransport::new(server)),
        TransportKind::Http => Arc::new(http::HttpTransport::new(config, Arc::new(server))),
    }
}
