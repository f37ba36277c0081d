//! TaskHub MCP Server
//!
//! Exposes TaskHub task management as MCP tools over stdio or streamable
//! HTTP, selected by `--transport`.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use taskhub_mcp::api::TaskHubClient;
use taskhub_mcp::cli::Cli;
use taskhub_mcp::config::Config;
use taskhub_mcp::logging;
use taskhub_mcp::server::TaskHubMcpServer;
use taskhub_mcp::transport;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        // log, give the subscriber a moment to flush, then exit deliberately
        error!(error = %err, "fatal error, shutting down");
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    logging::init_tracing(cli.log_level.as_deref())?;
    let config = Arc::new(Config::from_cli(cli)?);

    info!(
        transport = %config.transport,
        "starting taskhub-mcp v{}",
        env!("CARGO_PKG_VERSION")
    );

    let api = Arc::new(TaskHubClient::new(&config)?);
    let server = TaskHubMcpServer::new(api);
    let transport = transport::build_transport(config, server);

    let mut serving = tokio::spawn(transport.clone().start());
    tokio::select! {
        result = &mut serving => {
            result??;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            transport.stop();
            serving.await??;
        }
    }

    info!("server shut down cleanly");
    Ok(())
}
