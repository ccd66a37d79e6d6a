//! Route matching logic.
//!
//! # Responsibilities
//! - Select the most specific route for a request path
//! - Fall through to the default target when nothing matches
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Longest prefix wins; equal lengths resolve to the earliest declared route
//! - No regex and no index: O(n) scan over a configuration-sized list

use crate::routing::table::{Route, RouteTable, Target};

/// Return the route whose prefix is the longest match for `path`.
pub fn match_route<'a>(table: &'a RouteTable, path: &str) -> Option<&'a Route> {
    let mut best: Option<&Route> = None;
    for route in table.routes() {
        if !route.matcher().matches(path) {
            continue;
        }
        // Strictly longer only, so the first declared route keeps a tie.
        let longer = best
            .map(|b| route.matcher().path().len() > b.matcher().path().len())
            .unwrap_or(true);
        if longer {
            best = Some(route);
        }
    }
    best
}

/// The upstream a request for `path` goes to, together with the matched route.
pub fn resolve<'a>(table: &'a RouteTable, path: &str) -> (Option<&'a Route>, &'a Target) {
    match match_route(table, path) {
        Some(route) => (Some(route), route.target()),
        None => (None, table.default_target()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::table::PathMatch;

    fn route(name: &str, prefix: &str, base_url: &str) -> Route {
        Route {
            name: name.to_string(),
            matcher: PathMatch::Prefix(prefix.to_string()),
            target: Target::new(base_url),
            rewrite: None,
        }
    }

    fn table(routes: Vec<Route>) -> RouteTable {
        RouteTable {
            default_target: Target::new("http://default:80"),
            routes,
            generation: 1,
        }
    }

    #[test]
    fn test_longest_prefix_wins() {
        let t = table(vec![
            route("api", "/api", "http://api:80"),
            route("api-v2", "/api/v2", "http://api-v2:80"),
            route("root", "/", "http://root:80"),
        ]);

        assert_eq!(match_route(&t, "/api/v2/users").unwrap().name(), "api-v2");
        assert_eq!(match_route(&t, "/api/v1/users").unwrap().name(), "api");
        assert_eq!(match_route(&t, "/static/app.js").unwrap().name(), "root");
    }

    #[test]
    fn test_declaration_order_irrelevant() {
        let t = table(vec![
            route("api-v2", "/api/v2", "http://api-v2:80"),
            route("api", "/api", "http://api:80"),
        ]);
        assert_eq!(match_route(&t, "/api/v2").unwrap().name(), "api-v2");
        assert_eq!(match_route(&t, "/api").unwrap().name(), "api");
    }

    #[test]
    fn test_equal_length_first_declared_wins() {
        // The validator rejects duplicate prefixes; the matcher still stays deterministic.
        let t = table(vec![
            route("first", "/auth", "http://a:80"),
            route("second", "/auth", "http://b:80"),
        ]);
        assert_eq!(match_route(&t, "/auth/login").unwrap().name(), "first");
    }

    #[test]
    fn test_case_sensitive() {
        let t = table(vec![route("api", "/api", "http://api:80")]);
        assert!(match_route(&t, "/API/x").is_none());
    }

    #[test]
    fn test_no_match_resolves_default() {
        let t = table(vec![route("api", "/api", "http://api:80")]);
        let (matched, target) = resolve(&t, "/mail/send");
        assert!(matched.is_none());
        assert_eq!(target.base_url(), "http://default:80");

        let (matched, target) = resolve(&t, "/api/x");
        assert_eq!(matched.unwrap().name(), "api");
        assert_eq!(target.base_url(), "http://api:80");
    }

    #[test]
    fn test_empty_table() {
        let t = table(Vec::new());
        assert!(match_route(&t, "/").is_none());
    }
}
