//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::GatewaySettings;
use crate::config::validation::validate_route_table;
use crate::routing::RouteTable;

/// Error type for configuration loading, validation and watching.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings file: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("route configuration must be a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(String),

    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("duplicate value for `{field}`: {value}")]
    Duplicate { field: String, value: String },

    #[error("invalid URL `{url}` in `{field}`: {reason}")]
    InvalidUrl {
        field: String,
        url: String,
        reason: String,
    },

    #[error("config watch unavailable: {0}")]
    Watch(#[from] notify::Error),
}

/// Parse and validate a route table from JSON text.
pub fn parse_route_table(content: &str) -> Result<RouteTable, ConfigError> {
    let doc: serde_json::Value = serde_json::from_str(content)?;
    validate_route_table(&doc)
}

/// Load and validate a route table from a JSON file.
pub fn load_route_table(path: &Path) -> Result<RouteTable, ConfigError> {
    let content = read(path)?;
    parse_route_table(&content)
}

/// Load gateway settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<GatewaySettings, ConfigError> {
    let content = read(path)?;
    Ok(toml::from_str(&content)?)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
