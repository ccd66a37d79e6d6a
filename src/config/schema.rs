//! Process settings schema.
//!
//! These are the settings of the gateway process itself (ports, logging,
//! upstream client tuning). The route table lives in a separate JSON file so it
//! can be hot reloaded; see `config::validation`.

use serde::{Deserialize, Serialize};

/// Root settings for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewaySettings {
    /// Name reported by the health endpoint and in logs.
    pub service_name: String,

    /// Path of the JSON route table.
    pub routes_path: String,

    /// Liveness path answered by the gateway itself.
    pub health_path: String,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Outbound client settings.
    pub upstream: UpstreamConfig,

    /// Hot reload behavior.
    pub reload: ReloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            service_name: "gateway".to_string(),
            routes_path: "routes.json".to_string(),
            health_path: "/health".to_string(),
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            reload: ReloadConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// One listening socket is bound per port.
    pub ports: Vec<u16>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            ports: vec![8080],
        }
    }
}

/// Outbound HTTP client settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Deadline for receiving the upstream response head, in milliseconds.
    /// 0 disables the deadline.
    pub timeout_ms: u64,

    /// TCP connect timeout in milliseconds. 0 disables it.
    pub connect_timeout_ms: u64,

    /// Idle connections kept per upstream host. 0 means a fresh connection per request.
    pub pool_max_idle_per_host: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 0,
            connect_timeout_ms: 5_000,
            pool_max_idle_per_host: 0,
        }
    }
}

/// Hot reload settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Watch the route file for changes.
    pub watch: bool,

    /// Quiet period collapsing bursts of file events into one reload.
    pub debounce_ms: u64,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            watch: true,
            debounce_ms: 200,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus scrape address; metrics export is off when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_address: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let settings: GatewaySettings = toml::from_str("").unwrap();
        assert_eq!(settings.service_name, "gateway");
        assert_eq!(settings.listener.ports, vec![8080]);
        assert_eq!(settings.upstream.timeout_ms, 0);
        assert!(settings.reload.watch);
        assert_eq!(settings.observability.log_format, LogFormat::Text);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let settings: GatewaySettings = toml::from_str(
            r#"
            service_name = "edge"

            [listener]
            ports = [8080, 8443]

            [upstream]
            timeout_ms = 1500

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(settings.service_name, "edge");
        assert_eq!(settings.listener.bind_host, "0.0.0.0");
        assert_eq!(settings.listener.ports, vec![8080, 8443]);
        assert_eq!(settings.upstream.timeout_ms, 1500);
        assert_eq!(settings.upstream.connect_timeout_ms, 5_000);
        assert_eq!(settings.observability.log_format, LogFormat::Json);
        assert_eq!(settings.observability.log_level, "info");
    }
}
