//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate the route table
//! - Start hot reload (file watcher, SIGHUP, reloader task)
//! - Bind listeners and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: an invalid route table or a bind failure is fatal
//! - A missing watch mechanism is not fatal; the loaded table keeps serving
//! - Listeners start last (traffic only when ready)

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::{load_route_table, ConfigError, ConfigWatcher, GatewaySettings, Reloader};
use crate::http::GatewayServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{bind_all, ListenerError};
use crate::observability::metrics;
use crate::routing::RouteTableHandle;

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("route configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("listener: {0}")]
    Listener(#[from] ListenerError),

    #[error("invalid health path `{0}` (must start with `/`)")]
    HealthPath(String),
}

/// A running gateway.
pub struct Gateway {
    local_addrs: Vec<SocketAddr>,
    routes: Arc<RouteTableHandle>,
    shutdown: Shutdown,
    servers: JoinSet<std::io::Result<()>>,
    // Held so the watch and the reload channel stay alive.
    _watcher: Option<RecommendedWatcher>,
    triggers: mpsc::UnboundedSender<()>,
}

/// Load configuration, start hot reload, bind listeners and serve.
pub async fn start(settings: GatewaySettings) -> Result<Gateway, StartupError> {
    if !settings.health_path.starts_with('/') {
        return Err(StartupError::HealthPath(settings.health_path));
    }

    let routes_path = PathBuf::from(&settings.routes_path);
    let table = load_route_table(&routes_path)?;
    tracing::info!(
        path = ?routes_path,
        routes = table.routes().len(),
        default_target = table.default_target().base_url(),
        "Route table loaded"
    );

    let routes = Arc::new(RouteTableHandle::new(table));
    metrics::record_generation(1);

    let shutdown = Shutdown::new();
    let (triggers, trigger_rx) = mpsc::unbounded_channel();

    let watcher = if settings.reload.watch {
        match ConfigWatcher::new(&routes_path, triggers.clone()).run() {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!(error = %e, "Hot reload unavailable; serving the loaded route table");
                None
            }
        }
    } else {
        tracing::info!("Route file watching disabled");
        None
    };

    tokio::spawn(signals::forward_reload_signals(
        triggers.clone(),
        shutdown.subscribe(),
    ));

    let reloader = Reloader::new(
        &routes_path,
        Arc::clone(&routes),
        Duration::from_millis(settings.reload.debounce_ms),
    );
    tokio::spawn(reloader.run(trigger_rx, shutdown.subscribe()));

    let listeners = bind_all(&settings.listener).await?;
    let local_addrs = listeners
        .iter()
        .filter_map(|l| l.local_addr().ok())
        .collect();

    let servers = GatewayServer::new(&settings, Arc::clone(&routes)).spawn(listeners, &shutdown);

    Ok(Gateway {
        local_addrs,
        routes,
        shutdown,
        servers,
        _watcher: watcher,
        triggers,
    })
}

impl Gateway {
    /// Addresses actually bound, in port order.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// Handle to the route table currently serving.
    pub fn routes(&self) -> Arc<RouteTableHandle> {
        Arc::clone(&self.routes)
    }

    /// Ask the reloader to re-read the route file.
    pub fn request_reload(&self) {
        let _ = self.triggers.send(());
    }

    /// Stop listeners and the reloader.
    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Serve until `signal` resolves or a listener fails, then drain.
    pub async fn run_until<F>(mut self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()>,
    {
        let early = tokio::select! {
            _ = signal => None,
            Some(joined) = self.servers.join_next() => Some(joined),
        };

        self.shutdown.trigger();

        let mut result = Ok(());
        if let Some(joined) = early {
            result = flatten(joined);
        }
        while let Some(joined) = self.servers.join_next().await {
            if let Err(e) = flatten(joined) {
                tracing::error!(error = %e, "HTTP server exited with error");
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

fn flatten(joined: Result<std::io::Result<()>, tokio::task::JoinError>) -> std::io::Result<()> {
    joined.map_err(std::io::Error::other)?
}
