//! Runtime configuration
//!
//! A single explicit [`Config`] struct is built once at startup from the
//! parsed CLI arguments (which already carry env-var fallbacks and defaults)
//! and passed by `Arc` to every component that needs it. There is no global
//! mutable configuration.

use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;
use crate::transport::TransportKind;

/// Enforced floor for the session idle timeout.
pub const MIN_SESSION_TIMEOUT_SECS: u64 = 10;

/// How often the background sweep evicts idle sessions.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Errors produced while validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Session timeout below the enforced floor
    #[error("session timeout must be at least {MIN_SESSION_TIMEOUT_SECS}s, got {0}s")]
    SessionTimeoutTooShort(u64),

    /// The API base URL did not parse
    #[error("invalid TaskHub API URL: {0}")]
    InvalidApiUrl(String),

    /// max-connections of zero would reject every request
    #[error("max-connections must be greater than zero")]
    ZeroMaxConnections,
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub log_level: Option<String>,
    pub transport: TransportKind,
    pub http_host: String,
    pub http_port: u16,
    pub session_timeout: Duration,
    pub sweep_interval: Duration,
    pub allowed_origins: Vec<String>,
    pub allowed_hosts: Vec<String>,
    pub dns_rebinding_protection: bool,
    pub max_connections: usize,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub min_call_spacing: Duration,
}

impl Config {
    /// Build and validate a config from parsed CLI arguments
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let allowed_origins = if cli.allowed_origins.is_empty() {
            default_allowed_origins()
        } else {
            cli.allowed_origins
        };
        let allowed_hosts = if cli.allowed_hosts.is_empty() {
            default_allowed_hosts()
        } else {
            cli.allowed_hosts
        };

        let config = Self {
            api_url: cli.api_url,
            api_token: cli.api_token,
            request_timeout: Duration::from_secs(cli.request_timeout_secs),
            log_level: cli.log_level,
            transport: cli.transport,
            http_host: cli.host,
            http_port: cli.port,
            session_timeout: Duration::from_secs(cli.session_timeout_secs),
            sweep_interval: SWEEP_INTERVAL,
            allowed_origins,
            allowed_hosts,
            dns_rebinding_protection: cli.dns_rebinding_protection,
            max_connections: cli.max_connections,
            max_retries: cli.max_retries,
            retry_base_delay: Duration::from_millis(cli.retry_base_delay_ms),
            min_call_spacing: Duration::from_millis(cli.min_call_spacing_ms),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate invariants that clap cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_timeout < Duration::from_secs(MIN_SESSION_TIMEOUT_SECS) {
            return Err(ConfigError::SessionTimeoutTooShort(
                self.session_timeout.as_secs(),
            ));
        }
        if url::Url::parse(&self.api_url).is_err() {
            return Err(ConfigError::InvalidApiUrl(self.api_url.clone()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::ZeroMaxConnections);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://api.taskhub.io".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            log_level: None,
            transport: TransportKind::Stdio,
            http_host: "127.0.0.1".to_string(),
            http_port: 3000,
            session_timeout: Duration::from_secs(300),
            sweep_interval: SWEEP_INTERVAL,
            allowed_origins: default_allowed_origins(),
            allowed_hosts: default_allowed_hosts(),
            dns_rebinding_protection: false,
            max_connections: 128,
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            min_call_spacing: Duration::from_millis(100),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:*".to_string(),
        "http://127.0.0.1:*".to_string(),
    ]
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["localhost".to_string(), "127.0.0.1".to_string()]
}
