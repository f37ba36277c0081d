//! Tracing initialization
//!
//! Logs go to stderr (stdout is reserved for the MCP stdio transport).
//! The level comes from `--log-level` when given, otherwise from `RUST_LOG`,
//! otherwise `info` for this crate. Set `LOG_FORMAT=json` for structured
//! JSON output.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for the server process.
///
/// `level` is the explicit level from configuration; it takes precedence
/// over the `RUST_LOG` environment variable.
pub fn init_tracing(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(format!("taskhub_mcp={level}"))?,
        None => EnvFilter::from_default_env().add_directive("taskhub_mcp=info".parse()?),
    };

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}
