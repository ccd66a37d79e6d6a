//! OS signal handling.
//!
//! - SIGTERM / SIGINT (Ctrl+C) → graceful shutdown
//! - SIGHUP → route table reload, not shutdown

use tokio::sync::{broadcast, mpsc};

/// Resolve when the process is asked to stop.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received");
}

/// Forward SIGHUP as a reload trigger until shutdown.
#[cfg(unix)]
pub async fn forward_reload_signals(
    triggers: mpsc::UnboundedSender<()>,
    mut shutdown: broadcast::Receiver<()>,
) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            tracing::warn!(error = %e, "SIGHUP handler unavailable; reload on signal disabled");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received, reloading route table");
                if triggers.send(()).is_err() {
                    break;
                }
            }
            _ = shutdown.recv() => break,
        }
    }
}

#[cfg(not(unix))]
pub async fn forward_reload_signals(
    _triggers: mpsc::UnboundedSender<()>,
    _shutdown: broadcast::Receiver<()>,
) {
}
