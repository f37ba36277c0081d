//! Streamable HTTP transport
//!
//! Multiplexes many concurrent MCP client sessions over one process. The
//! session registry tracks lifecycles, the router demultiplexes inbound
//! requests onto per-session transport bindings, and an independent sweep
//! evicts idle sessions.

pub mod connection;
pub mod router;
pub mod rpc;
pub mod session;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use super::{Transport, TransportKind};
use crate::config::Config;
use crate::invoker::ToolInvoker;
use router::HttpState;

/// The HTTP deployment mode: binds, serves, and shuts down the session layer
pub struct HttpTransport {
    config: Arc<Config>,
    state: HttpState,
    shutdown: watch::Sender<bool>,
}

impl HttpTransport {
    pub fn new(config: Arc<Config>, invoker: Arc<dyn ToolInvoker>) -> Self {
        let state = HttpState::new(config.clone(), invoker);
        let (shutdown, _) = watch::channel(false);
        Self {
            config,
            state,
            shutdown,
        }
    }

    /// Shared handler state, exposed for in-process serving in tests
    pub fn state(&self) -> &HttpState {
        &self.state
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    async fn start(self: Arc<Self>) -> anyhow::Result<()> {
        self.state
            .registry
            .start_sweeper(self.config.sweep_interval);

        let listener = TcpListener::bind((
            self.config.http_host.as_str(),
            self.config.http_port,
        ))
        .await?;
        info!(
            addr = %listener.local_addr()?,
            session_timeout_secs = self.config.session_timeout.as_secs(),
            "HTTP transport listening"
        );

        let app = router::build_router(self.state.clone());
        let mut shutdown = self.shutdown.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await?;

        self.state.shutdown();
        info!("HTTP transport stopped");
        Ok(())
    }

    fn stop(&self) {
        let _ = self.shutdown.send(true);
    }
}
