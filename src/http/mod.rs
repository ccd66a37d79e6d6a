//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, health short-circuit)
//!     → request.rs (request ID)
//!     → routing (match + rewrite against the current table)
//!     → forward.rs (upstream request, streamed bodies)
//!     → headers.rs (hop-by-hop filtering, X-Forwarded-*)
//!     → response.rs (502 mapping on failure)
//!     → Send to client
//! ```

pub mod forward;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{ProxyError, BAD_GATEWAY_BODY};
pub use server::{AppState, ExchangeState, GatewayServer};
