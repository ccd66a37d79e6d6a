//! Route Gateway Library
//!
//! Reverse proxy core: a hot-reloadable prefix route table, a path rewriter,
//! and a streaming forwarder behind an Axum front door.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::GatewaySettings;
pub use http::GatewayServer;
pub use lifecycle::{Gateway, Shutdown};
pub use routing::{RouteTable, RouteTableHandle};
