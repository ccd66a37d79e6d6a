//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind one socket per configured port
//! - Report bind failures with the offending address

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The bind host is not an IP address.
    #[error("invalid bind host `{0}`")]
    InvalidHost(String),

    /// No ports configured.
    #[error("no listen ports configured")]
    NoPorts,

    /// Failed to bind to address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Bind every configured port. Any failure aborts the whole set.
pub async fn bind_all(config: &ListenerConfig) -> Result<Vec<TcpListener>, ListenerError> {
    if config.ports.is_empty() {
        return Err(ListenerError::NoPorts);
    }
    let host: IpAddr = config
        .bind_host
        .parse()
        .map_err(|_| ListenerError::InvalidHost(config.bind_host.clone()))?;

    let mut listeners = Vec::with_capacity(config.ports.len());
    for port in &config.ports {
        let addr = SocketAddr::new(host, *port);
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { addr, source })?;

        tracing::info!(
            address = %listener.local_addr().unwrap_or(addr),
            "Listener bound"
        );
        listeners.push(listener);
    }
    Ok(listeners)
}
