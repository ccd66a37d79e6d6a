//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health and proxy handlers
//! - Wire up middleware (request ID, request logging, panic catching)
//! - Serve one listener per configured port
//! - Dispatch requests through match → rewrite → forward

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request, Response},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tower_http::{catch_panic::CatchPanicLayer, classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::Span;

use crate::config::GatewaySettings;
use crate::http::forward::Forwarder;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::response::{panic_response, ProxyError};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{resolve, Route, RouteTableHandle};

/// Per-request progress, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Received,
    Matched,
    Forwarding,
    StreamingResponse,
    Completed,
    Failed,
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExchangeState::Received => "received",
            ExchangeState::Matched => "matched",
            ExchangeState::Forwarding => "forwarding",
            ExchangeState::StreamingResponse => "streaming_response",
            ExchangeState::Completed => "completed",
            ExchangeState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTableHandle>,
    pub forwarder: Forwarder,
    pub service_name: Arc<str>,
}

/// HTTP front door of the gateway.
pub struct GatewayServer {
    router: Router,
}

impl GatewayServer {
    /// Create a new HTTP server reading routes from `routes`.
    pub fn new(settings: &GatewaySettings, routes: Arc<RouteTableHandle>) -> Self {
        let state = AppState {
            routes,
            forwarder: Forwarder::new(&settings.upstream),
            service_name: Arc::from(settings.service_name.as_str()),
        };
        Self {
            router: Self::build_router(&settings.health_path, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(health_path: &str, state: AppState) -> Router {
        Router::new()
            // Only GET is answered locally; other methods on the path are proxied.
            .route(health_path, get(health_handler).fallback(proxy_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(propagate_request_id_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request.request_id(),
                        )
                    })
                    .on_request(())
                    .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                        tracing::info!(
                            status = response.status().as_u16(),
                            latency_ms = latency.as_millis() as u64,
                            "Request completed"
                        );
                    })
                    .on_eos(|_trailers: Option<&HeaderMap>, duration: Duration, _span: &Span| {
                        tracing::debug!(
                            state = %ExchangeState::Completed,
                            stream_ms = duration.as_millis() as u64,
                            "Response stream finished"
                        );
                    })
                    .on_failure(|class: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        tracing::warn!(
                            state = %ExchangeState::Failed,
                            classification = %class,
                            latency_ms = latency.as_millis() as u64,
                            "Request failed"
                        );
                    }),
            )
            .layer(set_request_id_layer())
    }

    /// The configured router, for serving on custom listeners.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve every listener until `shutdown` fires.
    pub fn spawn(self, listeners: Vec<TcpListener>, shutdown: &Shutdown) -> JoinSet<std::io::Result<()>> {
        let mut servers = JoinSet::new();
        for listener in listeners {
            let app = self
                .router
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>();
            let mut stop = shutdown.subscribe();

            servers.spawn(async move {
                let addr = listener.local_addr()?;
                tracing::info!(address = %addr, "HTTP server starting");

                axum::serve(listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = stop.recv().await;
                    })
                    .await?;

                tracing::info!(address = %addr, "HTTP server stopped");
                Ok(())
            });
        }
        servers
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "ok": true,
        "service": &*state.service_name,
        "time": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

/// Main proxy handler.
/// Looks up route, rewrites the path, and forwards request.
async fn proxy_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);

    tracing::debug!(state = %ExchangeState::Received, "Proxying request");

    // One snapshot for the whole exchange, even if a reload lands meanwhile.
    let table = state.routes.current();
    let (route, target) = resolve(&table, &path);
    let route_name = route.map(Route::name).unwrap_or("default");

    tracing::debug!(
        state = %ExchangeState::Matched,
        route = route_name,
        generation = table.generation(),
        upstream = target.base_url(),
        "Route resolved"
    );

    tracing::debug!(state = %ExchangeState::Forwarding, "Forwarding to upstream");
    let result = state
        .forwarder
        .forward(request, target, route.and_then(Route::rewrite), peer)
        .await;

    match result {
        Ok(response) => {
            tracing::debug!(
                state = %ExchangeState::StreamingResponse,
                status = response.status().as_u16(),
                "Upstream responded"
            );
            metrics::record_request(&method, response.status().as_u16(), route_name, start_time);
            Ok(response)
        }
        Err(e) => {
            tracing::debug!(state = %ExchangeState::Failed, route = route_name, "Forwarding failed");
            metrics::record_request(&method, 502, route_name, start_time);
            Err(e)
        }
    }
}
