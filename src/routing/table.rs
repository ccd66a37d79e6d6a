//! Validated route table and its atomically swappable handle.
//!
//! # Responsibilities
//! - Hold the routes and default target of one configuration generation
//! - Publish replacement tables without blocking readers
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Only the config validator builds routes, so field invariants hold by construction
//! - Readers take an `Arc` snapshot per request; a reload never tears a table

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Upstream origin a request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    base_url: String,
}

impl Target {
    pub(crate) fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Base URL exactly as configured.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL without trailing slashes, ready to be joined with a path.
    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// How a route selects requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    /// Case-sensitive byte prefix of the request path.
    Prefix(String),
}

impl PathMatch {
    pub fn path(&self) -> &str {
        match self {
            PathMatch::Prefix(path) => path,
        }
    }

    pub fn matches(&self, request_path: &str) -> bool {
        match self {
            PathMatch::Prefix(prefix) => request_path.starts_with(prefix.as_str()),
        }
    }
}

/// Path transformation applied before forwarding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteRule {
    pub strip_prefix: Option<String>,
    pub prepend: Option<String>,
}

/// One forwarding rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub(crate) name: String,
    pub(crate) matcher: PathMatch,
    pub(crate) target: Target,
    pub(crate) rewrite: Option<RewriteRule>,
}

impl Route {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &PathMatch {
        &self.matcher
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn rewrite(&self) -> Option<&RewriteRule> {
        self.rewrite.as_ref()
    }
}

/// The routing configuration in force at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    pub(crate) default_target: Target,
    pub(crate) routes: Vec<Route>,
    pub(crate) generation: u64,
}

impl RouteTable {
    pub fn default_target(&self) -> &Target {
        &self.default_target
    }

    /// Routes in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Publication counter; 0 until the table has been published.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Shared reference to the current route table.
///
/// Writers replace the whole table; readers never lock.
#[derive(Debug)]
pub struct RouteTableHandle {
    current: ArcSwap<RouteTable>,
    next_generation: AtomicU64,
}

impl RouteTableHandle {
    /// Publish `initial` as generation 1.
    pub fn new(mut initial: RouteTable) -> Self {
        initial.generation = 1;
        Self {
            current: ArcSwap::from_pointee(initial),
            next_generation: AtomicU64::new(2),
        }
    }

    /// Snapshot of the table in force right now.
    pub fn current(&self) -> Arc<RouteTable> {
        self.current.load_full()
    }

    /// Atomically replace the current table. Returns the assigned generation.
    pub fn publish(&self, mut table: RouteTable) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        table.generation = generation;
        self.current.store(Arc::new(table));
        generation
    }
}
