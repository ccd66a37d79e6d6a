//! Header manipulation for forwarded traffic.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Add X-Forwarded-Proto, X-Forwarded-Host, X-Forwarded-For
//!
//! # Design Decisions
//! - Headers named in `Connection` are hop-by-hop too
//! - `host` is dropped; the client derives it from the upstream URI
//! - Multi-valued headers keep every value and their order

use std::net::SocketAddr;

use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, CONNECTION, HOST, PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION, TE, TRAILER, TRANSFER_ENCODING, UPGRADE,
};
use axum::http::Uri;

pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const KEEP_ALIVE: HeaderName = HeaderName::from_static("keep-alive");

/// Headers that only make sense for a single connection.
pub const HOP_BY_HOP: [HeaderName; 9] = [
    CONNECTION,
    KEEP_ALIVE,
    PROXY_AUTHENTICATE,
    PROXY_AUTHORIZATION,
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
    HOST,
];

pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    HOP_BY_HOP.contains(name)
}

/// Header names listed as connection options in `Connection`.
fn connection_options(headers: &HeaderMap) -> Vec<HeaderName> {
    headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect()
}

/// Copy `src` without hop-by-hop headers.
pub fn strip_hop_by_hop(src: &HeaderMap) -> HeaderMap {
    let options = connection_options(src);
    let mut out = HeaderMap::with_capacity(src.len());
    for (name, value) in src.iter() {
        if is_hop_by_hop(name) || options.contains(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

/// Build the header map sent upstream for an inbound request.
pub fn forwarded_request_headers(
    inbound: &HeaderMap,
    uri: &Uri,
    peer: Option<SocketAddr>,
) -> HeaderMap {
    let mut out = strip_hop_by_hop(inbound);

    let proto = uri.scheme_str().unwrap_or("http");
    out.insert(X_FORWARDED_PROTO, HeaderValue::from_static(static_proto(proto)));

    let host = inbound
        .get(HOST)
        .cloned()
        .or_else(|| uri.authority().and_then(|a| HeaderValue::from_str(a.as_str()).ok()));
    if let Some(host) = host {
        out.insert(X_FORWARDED_HOST, host);
    }

    if let Some(peer) = peer {
        let ip = peer.ip().to_string();
        let chain = match out.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) if !prior.is_empty() => format!("{}, {}", prior, ip),
            _ => ip,
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            out.insert(X_FORWARDED_FOR, value);
        }
    }

    out
}

fn static_proto(scheme: &str) -> &'static str {
    if scheme.eq_ignore_ascii_case("https") {
        "https"
    } else {
        "http"
    }
}
