//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional) + CLI/env overrides
//!     → schema.rs (GatewaySettings)
//!
//! route file (JSON)
//!     → loader.rs (read & parse)
//!     → validation.rs (semantic checks)
//!     → RouteTable (validated, immutable)
//!     → published via RouteTableHandle
//!
//! On change (file event or SIGHUP):
//!     watcher.rs detects change
//!     → Reloader loads + validates
//!     → atomic swap of Arc<RouteTable>
//!     → next request observes the new table
//! ```
//!
//! # Design Decisions
//! - Route tables are immutable once loaded; changes require full reload
//! - A failed reload never replaces a working table
//! - Validation separates syntactic (serde_json) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use cli::Cli;
pub use loader::{load_route_table, load_settings, parse_route_table, ConfigError};
pub use schema::{GatewaySettings, ListenerConfig, LogFormat, ObservabilityConfig, UpstreamConfig};
pub use watcher::{ConfigWatcher, ReloadOutcome, Reloader};
