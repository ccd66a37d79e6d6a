//! Command line and environment overrides.
//!
//! Precedence, lowest first: built-in defaults, the TOML settings file,
//! environment variables, command line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{load_settings, ConfigError};
use crate::config::schema::{GatewaySettings, LogFormat};

#[derive(Debug, Parser)]
#[command(name = "route-gateway")]
#[command(about = "Reverse proxy gateway with hot-reloadable prefix routing", long_about = None)]
pub struct Cli {
    /// TOML settings file.
    #[arg(long, env = "GATEWAY_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Service name reported by the health endpoint.
    #[arg(long, env = "SERVICE_NAME")]
    pub service_name: Option<String>,

    /// Listen port(s), comma separated.
    #[arg(short, long = "port", env = "PORT", value_delimiter = ',')]
    pub ports: Vec<u16>,

    /// JSON route table.
    #[arg(short, long, env = "ROUTES_FILE")]
    pub routes: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,

    /// Upstream response deadline in milliseconds (0 disables it).
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS")]
    pub upstream_timeout_ms: Option<u64>,

    /// Prometheus exporter address (e.g. 0.0.0.0:9090).
    #[arg(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<String>,

    /// Disable watching the route file.
    #[arg(long)]
    pub no_watch: bool,
}

impl Cli {
    /// Resolve the effective settings.
    pub fn into_settings(self) -> Result<GatewaySettings, ConfigError> {
        let base = match &self.settings {
            Some(path) => load_settings(path)?,
            None => GatewaySettings::default(),
        };
        Ok(self.apply(base))
    }

    fn apply(self, mut settings: GatewaySettings) -> GatewaySettings {
        if let Some(name) = self.service_name {
            settings.service_name = name;
        }
        if !self.ports.is_empty() {
            settings.listener.ports = self.ports;
        }
        if let Some(routes) = self.routes {
            settings.routes_path = routes.to_string_lossy().into_owned();
        }
        if let Some(level) = self.log_level {
            settings.observability.log_level = level;
        }
        if let Some(format) = self.log_format {
            settings.observability.log_format = format;
        }
        if let Some(timeout) = self.upstream_timeout_ms {
            settings.upstream.timeout_ms = timeout;
        }
        if let Some(addr) = self.metrics_addr {
            settings.observability.metrics_address = Some(addr);
        }
        if self.no_watch {
            settings.reload.watch = false;
        }
        settings
    }
}
