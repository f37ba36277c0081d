//! stdio transport
//!
//! Serves the MCP protocol over stdin/stdout through the rmcp service.
//! Logging must stay on stderr in this mode.

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::ServiceExt;
use tokio::sync::Notify;
use tracing::info;

use super::{Transport, TransportKind};
use crate::server::TaskHubMcpServer;

pub struct StdioTransport {
    server: TaskHubMcpServer,
    shutdown: Notify,
}

impl StdioTransport {
    pub fn new(server: TaskHubMcpServer) -> Self {
        Self {
            server,
            shutdown: Notify::new(),
        }
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Stdio
    }

    async fn start(self: Arc<Self>) -> anyhow::Result<()> {
        let service = self.server.clone().serve(rmcp::transport::stdio()).await?;
        info!("stdio transport running, waiting for requests");

        tokio::select! {
            result = service.waiting() => {
                result?;
                info!("stdio client disconnected");
            }
            _ = self.shutdown.notified() => {
                info!("stdio transport stopped");
            }
        }
        Ok(())
    }

    fn stop(&self) {
        self.shutdown.notify_one();
    }
}
