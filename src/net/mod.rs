//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig (host + ports)
//!     → listener.rs (one bound socket per port)
//!     → Hand off to HTTP layer (axum::serve per socket)
//! ```
//!
//! # Design Decisions
//! - All ports are bound before any traffic is served
//! - A bind failure is fatal at startup

pub mod listener;

pub use listener::{bind_all, ListenerError};
