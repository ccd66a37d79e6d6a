//! Client-visible error responses.
//!
//! # Responsibilities
//! - Map forwarding failures to 502 Bad Gateway
//! - Keep the error body stable and free of internal detail
//!
//! # Design Decisions
//! - Detail (upstream URL, io error) goes to the log only
//! - Panics inside the pipeline produce the same body as upstream failures

use std::any::Any;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Body sent for every pipeline failure.
pub const BAD_GATEWAY_BODY: &str = r#"{"ok":false,"error":"bad gateway"}"#;

/// Errors raised while forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("upstream {upstream} unreachable: {source}")]
    UpstreamUnreachable {
        upstream: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },

    #[error("upstream {upstream} did not respond within {timeout:?}")]
    UpstreamTimeout { upstream: String, timeout: Duration },

    #[error("cannot build upstream URI `{uri}`: {source}")]
    InvalidUpstreamUri {
        uri: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("cannot build upstream request: {0}")]
    RequestBuild(#[from] axum::http::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Proxy request failed");
        bad_gateway()
    }
}

/// The uniform 502 response.
pub fn bad_gateway() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [(header::CONTENT_TYPE, "application/json")],
        BAD_GATEWAY_BODY,
    )
        .into_response()
}

/// `CatchPanicLayer` handler.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "Request handler panicked");
    bad_gateway()
}
