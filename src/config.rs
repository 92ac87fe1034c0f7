//! Per-component configuration, read once at startup.
//!
//! The runtime never reaches for process-wide singletons: a `Config` is
//! built explicitly (usually via [`Config::from_env`]) and threaded into
//! whichever collaborator needs it, the same way [`crate::Clock`] is
//! injected rather than assumed.

use std::env;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

/// Transport the server binds: a TCP port, or a Unix domain socket path.
#[derive(Debug, Clone)]
pub enum Transport {
    Tcp(u16),
    Uds(PathBuf),
}

/// Startup configuration for one component instance.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name published in this component's descriptor (`COMPONENT_NAME`).
    pub component_name: String,
    /// One of `debug|info|warn|error` (`LOG_LEVEL`, default `info`).
    pub log_level: String,
    /// Default prefix used when packing emitted payloads (`TYPE_URL_PREFIX`).
    pub type_url_prefix: String,
    /// How this component's server binds.
    pub transport: Transport,
}

impl Config {
    /// Build a `Config` from environment variables, falling back to
    /// `component_name`/`default_port` when the corresponding var is unset.
    ///
    /// - `SOCKET_PATH`: if set, binds a UDS there and `PORT` is ignored.
    /// - `PORT`: TCP port (default: `default_port`).
    /// - `COMPONENT_NAME`: defaults to `component_name`.
    /// - `LOG_LEVEL`: defaults to `"info"`.
    /// - `TYPE_URL_PREFIX`: defaults to [`crate::convert::TYPE_URL_PREFIX`].
    pub fn from_env(component_name: &str, default_port: u16) -> Self {
        let transport = match env::var("SOCKET_PATH") {
            Ok(path) if !path.is_empty() => Transport::Uds(PathBuf::from(path)),
            _ => {
                let port = env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default_port);
                Transport::Tcp(port)
            }
        };

        Self {
            component_name: env::var("COMPONENT_NAME").unwrap_or_else(|_| component_name.to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            type_url_prefix: env::var("TYPE_URL_PREFIX")
                .unwrap_or_else(|_| crate::convert::TYPE_URL_PREFIX.to_string()),
            transport,
        }
    }

    /// Install a global `tracing` subscriber honoring `self.log_level`.
    ///
    /// Safe to call more than once across a process (later calls are a
    /// no-op); intended to run once near the top of `main`.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_new(&self.log_level)
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    }
}
