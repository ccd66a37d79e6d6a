//! Path rewriting for forwarded requests.
//!
//! Pure string transformation, applied after a route has been selected.

use crate::routing::table::RewriteRule;

/// Apply `rule` to `original`, producing the path sent upstream.
pub fn rewrite_path(original: &str, rule: Option<&RewriteRule>) -> String {
    let Some(rule) = rule else {
        return original.to_string();
    };

    let mut path = original.to_string();

    if let Some(prefix) = rule.strip_prefix.as_deref() {
        if let Some(rest) = path.strip_prefix(prefix) {
            path = if rest.is_empty() {
                "/".to_string()
            } else if rest.starts_with('/') {
                rest.to_string()
            } else {
                format!("/{}", rest)
            };
        }
    }

    if let Some(prepend) = rule.prepend.as_deref() {
        let head = prepend.trim_end_matches('/');
        path = if path.starts_with('/') {
            format!("{}{}", head, path)
        } else {
            format!("{}/{}", head, path)
        };
    }

    path
}
