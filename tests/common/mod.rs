//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Json, Router};
use futures_util::StreamExt;
use route_gateway::config::GatewaySettings;
use route_gateway::lifecycle::{self, Gateway, StartupError};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Notify};

/// Read until the end of the request head so the peer never sees a reset.
async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

/// Start a raw TCP backend answering every request with `response` verbatim.
/// Returns its address and a hit counter.
pub async fn start_raw_backend(response: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let addr = start_programmable_backend(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async move { response.to_string() }
    })
    .await;
    (addr, hits)
}

/// Start a raw TCP backend whose response text is produced per connection.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        read_request_head(&mut socket).await;
                        let response = f().await;
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A raw backend streaming a chunked body, see [`start_chunked_backend`].
pub struct ChunkedBackend {
    pub addr: SocketAddr,
    /// Lets the backend write past its first chunk.
    pub gate: Arc<Notify>,
    /// Yields once a write towards the gateway fails.
    pub write_failed: mpsc::UnboundedReceiver<()>,
}

/// Start a raw TCP backend answering with a chunked body of `chunks` chunks
/// of `chunk_size` bytes. After the first chunk it waits for `gate`, then
/// writes the rest with `interval` between chunks.
pub async fn start_chunked_backend(chunk_size: usize, chunks: usize, interval: Duration) -> ChunkedBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let gate = Arc::new(Notify::new());
    let (failed_tx, write_failed) = mpsc::unbounded_channel();

    let backend_gate = gate.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let gate = backend_gate.clone();
            let failed_tx = failed_tx.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let head = "HTTP/1.1 200 OK\r\n\
                            Content-Type: application/octet-stream\r\n\
                            Transfer-Encoding: chunked\r\n\r\n";
                let mut chunk = format!("{:x}\r\n", chunk_size).into_bytes();
                chunk.extend(std::iter::repeat(b'x').take(chunk_size));
                chunk.extend_from_slice(b"\r\n");

                if socket.write_all(head.as_bytes()).await.is_err()
                    || socket.write_all(&chunk).await.is_err()
                {
                    let _ = failed_tx.send(());
                    return;
                }
                gate.notified().await;

                for _ in 1..chunks {
                    if socket.write_all(&chunk).await.is_err() {
                        let _ = failed_tx.send(());
                        return;
                    }
                    if !interval.is_zero() {
                        tokio::time::sleep(interval).await;
                    }
                }
                let _ = socket.write_all(b"0\r\n\r\n").await;
                let _ = socket.shutdown().await;
            });
        }
    });

    ChunkedBackend {
        addr,
        gate,
        write_failed,
    }
}

/// Start an axum backend that describes each request it receives as JSON:
/// method, path, query, headers and the number of body bytes streamed in.
pub async fn start_echo_backend() -> SocketAddr {
    async fn echo(request: Request<Body>) -> Json<Value> {
        let (parts, body) = request.into_parts();
        let headers: BTreeMap<String, String> = parts
            .headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
            .collect();

        let mut body_len = 0usize;
        let mut stream = body.into_data_stream();
        while let Some(chunk) = stream.next().await {
            body_len += chunk.map(|c| c.len()).unwrap_or(0);
        }

        Json(json!({
            "method": parts.method.to_string(),
            "path": parts.uri.path(),
            "query": parts.uri.query(),
            "headers": headers,
            "body_len": body_len,
        }))
    }

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().fallback(echo);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A gateway serving on an ephemeral loopback port with its route file in a temp dir.
pub struct TestGateway {
    pub gateway: Gateway,
    pub addr: SocketAddr,
    pub routes_path: std::path::PathBuf,
    _dir: TempDir,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn write_routes(&self, routes_json: &str) {
        std::fs::write(&self.routes_path, routes_json).unwrap();
    }
}

pub fn test_settings(routes_path: &std::path::Path) -> GatewaySettings {
    let mut settings = GatewaySettings::default();
    settings.service_name = "test-gateway".to_string();
    settings.routes_path = routes_path.to_string_lossy().into_owned();
    settings.listener.bind_host = "127.0.0.1".to_string();
    settings.listener.ports = vec![0];
    settings.reload.debounce_ms = 50;
    settings
}

pub async fn try_start_gateway_with(
    routes_json: &str,
    configure: impl FnOnce(&mut GatewaySettings),
) -> Result<TestGateway, StartupError> {
    let dir = tempfile::tempdir().unwrap();
    let routes_path = dir.path().join("routes.json");
    std::fs::write(&routes_path, routes_json).unwrap();

    let mut settings = test_settings(&routes_path);
    configure(&mut settings);

    let gateway = lifecycle::start(settings).await?;
    let addr = gateway.local_addrs()[0];
    Ok(TestGateway {
        gateway,
        addr,
        routes_path,
        _dir: dir,
    })
}

pub async fn start_gateway_with(
    routes_json: &str,
    configure: impl FnOnce(&mut GatewaySettings),
) -> TestGateway {
    try_start_gateway_with(routes_json, configure)
        .await
        .expect("gateway should start")
}

pub async fn start_gateway(routes_json: &str) -> TestGateway {
    start_gateway_with(routes_json, |_| {}).await
}

/// A client that never pools, never follows redirects and ignores proxy env vars.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

pub fn default_only(base_url: &str) -> String {
    json!({ "defaultTarget": { "baseUrl": base_url } }).to_string()
}
