//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the upstream URI from target, rewritten path and query
//! - Forward the request body as a stream (no buffering)
//! - Relay status, headers and streamed body back, redirects included
//!
//! # Design Decisions
//! - The hyper client never follows redirects; 3xx is relayed untouched
//! - No retries: a failed attempt is reported as 502
//! - Dropping the returned body drops the upstream connection

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header::CONTENT_LENGTH, Method, Request, Response, Uri};
use futures_util::TryStreamExt;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::UpstreamConfig;
use crate::http::headers::{forwarded_request_headers, strip_hop_by_hop};
use crate::http::response::ProxyError;
use crate::routing::{rewrite_path, RewriteRule, Target};

/// Sends requests to upstream targets.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Option<Duration>,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_nodelay(true);
        if config.connect_timeout_ms > 0 {
            connector.set_connect_timeout(Some(Duration::from_millis(config.connect_timeout_ms)));
        }

        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .build(connector);

        Self {
            client,
            timeout: (config.timeout_ms > 0).then(|| Duration::from_millis(config.timeout_ms)),
        }
    }

    /// Forward `request` to `target`, applying `rewrite` to its path.
    ///
    /// `peer` is the inbound client address, appended to `x-forwarded-for`.
    pub async fn forward(
        &self,
        request: Request<Body>,
        target: &Target,
        rewrite: Option<&RewriteRule>,
        peer: Option<SocketAddr>,
    ) -> Result<Response<Body>, ProxyError> {
        let (parts, body) = request.into_parts();

        let path = rewrite_path(parts.uri.path(), rewrite);
        let uri = upstream_uri(target, &path, parts.uri.query())?;
        let upstream = uri.to_string();

        // Bodies of GET/HEAD are not forwarded.
        let drop_body = parts.method == Method::GET || parts.method == Method::HEAD;
        let body = if drop_body { Body::empty() } else { body };

        let mut outbound = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .body(body)?;
        *outbound.headers_mut() = forwarded_request_headers(&parts.headers, &parts.uri, peer);
        if drop_body {
            // A stale length would leave the upstream waiting for bytes that never come.
            outbound.headers_mut().remove(CONTENT_LENGTH);
        }

        tracing::debug!(method = %parts.method, upstream = %upstream, "Forwarding request");

        let pending = self.client.request(outbound);
        let result = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, pending).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ProxyError::UpstreamTimeout { upstream, timeout });
                }
            },
            None => pending.await,
        };
        let response: Response<Incoming> = result.map_err(|source| ProxyError::UpstreamUnreachable {
            upstream: upstream.clone(),
            source,
        })?;

        let (mut head, incoming) = response.into_parts();
        head.headers = strip_hop_by_hop(&head.headers);

        // Once the head is sent, a body error can only abort the connection.
        let stream = Body::new(incoming).into_data_stream().inspect_err(move |e| {
            tracing::warn!(upstream = %upstream, error = %e, "Upstream stream error, aborting response");
        });

        Ok(Response::from_parts(head, Body::from_stream(stream)))
    }
}

/// Join a target origin with a forwarded path and optional query.
pub fn upstream_uri(target: &Target, path: &str, query: Option<&str>) -> Result<Uri, ProxyError> {
    let mut raw = String::with_capacity(target.origin().len() + path.len() + 1);
    raw.push_str(target.origin());
    if !path.starts_with('/') {
        raw.push('/');
    }
    raw.push_str(path);
    if let Some(query) = query {
        raw.push('?');
        raw.push_str(query);
    }

    Uri::try_from(raw.as_str()).map_err(|source| ProxyError::InvalidUpstreamUri { uri: raw, source })
}
