//! Route file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::config::loader::{load_route_table, ConfigError};
use crate::observability::metrics;
use crate::routing::{RouteTable, RouteTableHandle};

/// A watcher that monitors the route file for changes.
///
/// Each relevant file event sends a reload trigger; the `Reloader` does the
/// actual loading so that bursts of events collapse into one reload.
pub struct ConfigWatcher {
    path: PathBuf,
    trigger_tx: mpsc::UnboundedSender<()>,
}

impl ConfigWatcher {
    pub fn new(path: &Path, trigger_tx: mpsc::UnboundedSender<()>) -> Self {
        Self {
            path: path.to_path_buf(),
            trigger_tx,
        }
    }

    /// Start watching. The returned watcher must be kept alive.
    ///
    /// The parent directory is watched rather than the file so that editors
    /// replacing the file through a rename are still observed.
    pub fn run(self) -> Result<RecommendedWatcher, ConfigError> {
        let tx = self.trigger_tx.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if ours {
                        tracing::debug!(kind = ?event.kind, "Route file change detected");
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Route file watcher started");
        Ok(watcher)
    }
}

/// Result of one reload attempt.
#[derive(Debug)]
pub enum ReloadOutcome {
    /// A new table was published under this generation.
    Published(u64),
    /// The file parsed to the table already in force.
    Unchanged,
    /// The file was rejected; the previous table keeps serving.
    Rejected(ConfigError),
}

/// Reloads the route file and publishes valid tables.
#[derive(Clone)]
pub struct Reloader {
    path: PathBuf,
    handle: Arc<RouteTableHandle>,
    debounce: Duration,
}

impl Reloader {
    pub fn new(path: &Path, handle: Arc<RouteTableHandle>, debounce: Duration) -> Self {
        Self {
            path: path.to_path_buf(),
            handle,
            debounce,
        }
    }

    /// Load the route file once and publish it if it is valid and different.
    pub fn reload(&self) -> ReloadOutcome {
        let outcome = match load_route_table(&self.path) {
            Ok(table) => {
                let current = self.handle.current();
                if same_routing(&table, &current) {
                    tracing::debug!(generation = current.generation(), "Route file unchanged");
                    ReloadOutcome::Unchanged
                } else {
                    let routes = table.routes().len();
                    let generation = self.handle.publish(table);
                    tracing::info!(generation, routes, "Route table reloaded");
                    metrics::record_generation(generation);
                    ReloadOutcome::Published(generation)
                }
            }
            Err(e) => {
                tracing::error!(
                    path = ?self.path,
                    error = %e,
                    generation = self.handle.current().generation(),
                    "Failed to reload route table. Keeping current configuration."
                );
                ReloadOutcome::Rejected(e)
            }
        };
        metrics::record_reload(&outcome);
        outcome
    }

    /// Process reload triggers until shutdown or until every sender is gone.
    ///
    /// Shutdown is honoured during the debounce wait too. The file is read on
    /// the blocking pool.
    pub async fn run(
        self,
        mut triggers: mpsc::UnboundedReceiver<()>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                msg = triggers.recv() => {
                    if msg.is_none() {
                        break;
                    }
                }
                _ = shutdown.recv() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.debounce) => {}
                _ = shutdown.recv() => break,
            }
            while triggers.try_recv().is_ok() {}

            let reloader = self.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || reloader.reload()).await {
                tracing::error!(error = %e, "Reload task failed");
            }
        }
        tracing::info!("Reloader exiting");
    }
}

fn same_routing(a: &RouteTable, b: &RouteTable) -> bool {
    a.default_target() == b.default_target() && a.routes() == b.routes()
}
