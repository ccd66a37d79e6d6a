//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → table.rs (current RouteTable snapshot)
//!     → matcher.rs (longest prefix match)
//!     → rewrite.rs (strip / prepend)
//!     → Return: target + forwarded path
//!
//! Route Compilation (at load / reload):
//!     JSON route file
//!     → config::validation
//!     → Freeze as immutable RouteTable
//!     → Publish through RouteTableHandle
//! ```
//!
//! # Design Decisions
//! - Tables immutable at runtime, replaced as a whole
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same table and path always match the same route

pub mod matcher;
pub mod rewrite;
pub mod table;

pub use matcher::{match_route, resolve};
pub use rewrite::rewrite_path;
pub use table::{PathMatch, RewriteRule, Route, RouteTable, RouteTableHandle, Target};
