//! Route table validation.
//!
//! # Responsibilities
//! - Turn a parsed JSON document into a typed `RouteTable`
//! - Enforce required fields, the supported match kind, and URL shape
//! - Detect conflicting routes (duplicate names or prefixes)
//!
//! # Design Decisions
//! - Stops at the first violation; the error names the offending field
//! - Pure function: `&Value → Result<RouteTable, ConfigError>`
//! - Runs before a table is accepted into the system

use std::collections::HashSet;

use axum::http::uri::PathAndQuery;
use serde_json::{Map, Value};
use url::Url;

use crate::config::ConfigError;
use crate::routing::table::{PathMatch, RewriteRule, Route, RouteTable, Target};

/// Validate a parsed route document.
pub fn validate_route_table(doc: &Value) -> Result<RouteTable, ConfigError> {
    let root = doc.as_object().ok_or(ConfigError::NotAnObject)?;

    let default_target = target_at(root, "defaultTarget", "defaultTarget")?;

    // A missing or non-array `routes` means "no routes".
    let raw_routes: &[Value] = match root.get("routes") {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    };

    let mut names = HashSet::new();
    let mut prefixes = HashSet::new();
    let mut routes = Vec::with_capacity(raw_routes.len());

    for (index, raw) in raw_routes.iter().enumerate() {
        let at = format!("routes[{}]", index);
        let route = route_at(raw, &at)?;

        if !names.insert(route.name.clone()) {
            return Err(ConfigError::Duplicate {
                field: format!("{}.name", at),
                value: route.name,
            });
        }
        if !prefixes.insert(route.matcher.path().to_string()) {
            return Err(ConfigError::Duplicate {
                field: format!("{}.match.path", at),
                value: route.matcher.path().to_string(),
            });
        }
        routes.push(route);
    }

    Ok(RouteTable {
        default_target,
        routes,
        generation: 0,
    })
}

fn route_at(raw: &Value, at: &str) -> Result<Route, ConfigError> {
    let obj = raw.as_object().ok_or_else(|| ConfigError::InvalidField {
        field: at.to_string(),
        reason: "must be an object".to_string(),
    })?;

    let name = non_empty_str(obj, "name", &format!("{}.name", at))?;

    let match_at = format!("{}.match", at);
    let match_obj = object_at(obj, "match", &match_at)?;
    let kind = non_empty_str(match_obj, "type", &format!("{}.type", match_at))?;
    if kind != "prefix" {
        return Err(ConfigError::InvalidField {
            field: format!("{}.type", match_at),
            reason: format!("unsupported match type `{}` (expected `prefix`)", kind),
        });
    }
    let path = non_empty_str(match_obj, "path", &format!("{}.path", match_at))?;

    let target = target_at(obj, "target", &format!("{}.target", at))?;
    let rewrite = rewrite_at(obj, &format!("{}.rewrite", at))?;

    Ok(Route {
        name: name.to_string(),
        matcher: PathMatch::Prefix(path.to_string()),
        target,
        rewrite,
    })
}

fn target_at(parent: &Map<String, Value>, key: &str, at: &str) -> Result<Target, ConfigError> {
    let obj = object_at(parent, key, at)?;
    let field = format!("{}.baseUrl", at);
    let base_url = non_empty_str(obj, "baseUrl", &field)?;
    check_base_url(base_url, &field)?;
    Ok(Target::new(base_url))
}

fn rewrite_at(parent: &Map<String, Value>, at: &str) -> Result<Option<RewriteRule>, ConfigError> {
    let obj = match parent.get("rewrite") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            return Err(ConfigError::InvalidField {
                field: at.to_string(),
                reason: "must be an object".to_string(),
            })
        }
    };

    let prepend_field = format!("{}.prepend", at);
    let prepend = optional_str(obj, "prepend", &prepend_field)?;
    if let Some(prepend) = &prepend {
        check_path_segment(prepend, &prepend_field)?;
    }

    Ok(Some(RewriteRule {
        strip_prefix: optional_str(obj, "stripPrefix", &format!("{}.stripPrefix", at))?,
        prepend,
    }))
}

/// A prepended segment ends up in every upstream URI of its route.
fn check_path_segment(raw: &str, field: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    if raw.contains(|c| c == '?' || c == '#') {
        return Err(invalid("must not contain `?` or `#`"));
    }
    let path = format!("/{}", raw.trim_start_matches('/'));
    path.parse::<PathAndQuery>()
        .map_err(|_| invalid("is not a valid URI path"))?;
    Ok(())
}

fn check_base_url(raw: &str, field: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field: field.to_string(),
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed".to_string()));
    }
    Ok(())
}

fn object_at<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match parent.get(key) {
        Some(Value::Object(obj)) => Ok(obj),
        None | Some(Value::Null) => Err(ConfigError::MissingField(at.to_string())),
        Some(_) => Err(ConfigError::InvalidField {
            field: at.to_string(),
            reason: "must be an object".to_string(),
        }),
    }
}

fn non_empty_str<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<&'a str, ConfigError> {
    match parent.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        None | Some(Value::Null) => Err(ConfigError::MissingField(at.to_string())),
        Some(Value::String(_)) => Err(ConfigError::InvalidField {
            field: at.to_string(),
            reason: "must not be empty".to_string(),
        }),
        Some(_) => Err(ConfigError::InvalidField {
            field: at.to_string(),
            reason: "must be a string".to_string(),
        }),
    }
}

fn optional_str(
    parent: &Map<String, Value>,
    key: &str,
    at: &str,
) -> Result<Option<String>, ConfigError> {
    match parent.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ConfigError::InvalidField {
            field: at.to_string(),
            reason: "must be a string".to_string(),
        }),
    }
}
