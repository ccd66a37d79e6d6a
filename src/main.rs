//! Route Gateway
//!
//! A hot-reloadable reverse proxy built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                    GATEWAY                        │
//!   Client Request       │  ┌─────────┐    ┌─────────┐    ┌─────────────┐   │
//!   ─────────────────────┼─▶│   net   │───▶│  http   │───▶│  routing    │   │
//!                        │  │listener │    │ server  │    │match+rewrite│   │
//!                        │  └─────────┘    └─────────┘    └──────┬──────┘   │
//!                        │                                       ▼          │
//!   Client Response      │                 ┌─────────┐    ┌─────────────┐   │
//!   ◀────────────────────┼─────────────────│ headers │◀───│   forward   │◀──┼── Upstream
//!                        │                 └─────────┘    └─────────────┘   │
//!                        │                                                  │
//!                        │  config (loader, watcher) ──swap──▶ RouteTable   │
//!                        │  observability · lifecycle                       │
//!                        └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;

use route_gateway::config::Cli;
use route_gateway::lifecycle::{self, signals};
use route_gateway::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Cli::parse().into_settings()?;

    logging::init(
        &settings.observability.log_level,
        settings.observability.log_format,
    );

    tracing::info!(
        service = %settings.service_name,
        version = env!("CARGO_PKG_VERSION"),
        "route-gateway starting"
    );

    tracing::info!(
        routes_path = %settings.routes_path,
        ports = ?settings.listener.ports,
        upstream_timeout_ms = settings.upstream.timeout_ms,
        watch = settings.reload.watch,
        "Configuration loaded"
    );

    if let Some(addr) = &settings.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(metrics_address = %addr, "Failed to parse metrics address"),
        }
    }

    let gateway = match lifecycle::start(settings).await {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    gateway.run_until(signals::shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
