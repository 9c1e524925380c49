//! # Environment-Based Configuration
//!
//! ## Environment Variables
//!
//! - `FLOWMESH_HTTP_HOST` - Bind address (default: 127.0.0.1)
//! - `FLOWMESH_HTTP_PORT` - Bind port (default: 8080)
//! - `FLOWMESH_MAX_BODY_SIZE` - Maximum request body size in bytes (default: 1048576 / 1MB)
//! - `FLOWMESH_ENABLE_CORS` - Enable permissive CORS (default: true)
//! - `FLOWMESH_MAILBOX_CAPACITY` - Mailbox slots per agent (default: 10)
//! - `FLOWMESH_DRAIN_TIMEOUT_MS` - Mailbox drain deadline on close (default: 1000)

use flowmesh_core::{DRAIN_TIMEOUT_ENV, GraphSettings, MAILBOX_CAPACITY_ENV};
use std::{env, net::SocketAddr};

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid environment variable '{key}': {message}")]
    InvalidEnvVar { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// HTTP adapter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    pub max_body_size: usize,
    pub enable_cors: bool,
    pub graph: GraphSettings,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_size: 1024 * 1024, // 1MB
            enable_cors: true,
            graph: GraphSettings::default(),
        }
    }
}

impl HttpServerConfig {
    /// Address to bind, `host:port`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed socket address
    ///
    /// # Errors
    ///
    /// `ConfigError::ValidationError` if the host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address()
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("invalid bind address: {e}")))
    }
}

/// Builder for `HttpServerConfig` with environment variable support
#[derive(Debug, Clone, Default)]
pub struct HttpServerConfigBuilder {
    config: HttpServerConfig,
}

impl HttpServerConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        if let Some(host) = lookup("FLOWMESH_HTTP_HOST") {
            builder = builder.host(host);
        }
        if let Some(port) = parse_var::<u16>(&lookup, "FLOWMESH_HTTP_PORT")? {
            builder = builder.port(port);
        }
        if let Some(size) = parse_var::<usize>(&lookup, "FLOWMESH_MAX_BODY_SIZE")? {
            builder = builder.max_body_size(size);
        }
        if let Some(cors) = parse_bool(&lookup, "FLOWMESH_ENABLE_CORS")? {
            builder = builder.enable_cors(cors);
        }

        let graph = GraphSettings::from_lookup(&lookup).map_err(|e| {
            let message = e.to_string();
            let key = [DRAIN_TIMEOUT_ENV, MAILBOX_CAPACITY_ENV]
                .into_iter()
                .find(|key| message.contains(key))
                .unwrap_or(MAILBOX_CAPACITY_ENV);
            ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message,
            }
        })?;
        builder = builder.graph(graph);

        Ok(builder)
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.config.max_body_size = size;
        self
    }

    #[must_use]
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.config.enable_cors = enable;
        self
    }

    #[must_use]
    pub fn graph(mut self, graph: GraphSettings) -> Self {
        self.config.graph = graph;
        self
    }

    #[must_use]
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.graph = self.config.graph.mailbox_capacity(capacity);
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if the configuration is invalid.
    pub fn build(self) -> Result<HttpServerConfig, ConfigError> {
        let config = self.config;
        if config.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "host cannot be empty".to_string(),
            ));
        }
        if config.max_body_size == 0 {
            return Err(ConfigError::ValidationError(
                "max_body_size must be greater than 0".to_string(),
            ));
        }
        config
            .graph
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!("invalid value '{val}': {e}"),
            }),
        None => Ok(None),
    }
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>, ConfigError> {
    match lookup(key) {
        Some(val) => match val.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidEnvVar {
                key: key.to_string(),
                message: format!(
                    "invalid boolean value '{val}', expected true/false/1/0/yes/no/on/off"
                ),
            }),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_builder() {
        let config = HttpServerConfigBuilder::new().build().unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.max_body_size, 1024 * 1024);
        assert!(config.enable_cors);
        assert_eq!(config.graph.mailbox_capacity, 10);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = HttpServerConfigBuilder::from_lookup(lookup(&[
            ("FLOWMESH_HTTP_HOST", "0.0.0.0"),
            ("FLOWMESH_HTTP_PORT", "9000"),
            ("FLOWMESH_ENABLE_CORS", "off"),
            ("FLOWMESH_MAILBOX_CAPACITY", "32"),
        ]))
        .unwrap()
        .build()
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().port(), 9000);
        assert!(!config.enable_cors);
        assert_eq!(config.graph.mailbox_capacity, 32);
    }

    #[test]
    fn test_invalid_port_names_the_variable() {
        let err = HttpServerConfigBuilder::from_lookup(lookup(&[("FLOWMESH_HTTP_PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("FLOWMESH_HTTP_PORT"));
    }

    #[test]
    fn test_invalid_drain_timeout_names_the_variable() {
        let err = HttpServerConfigBuilder::from_lookup(lookup(&[(
            "FLOWMESH_DRAIN_TIMEOUT_MS",
            "soon",
        )]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar { ref key, .. } if key == "FLOWMESH_DRAIN_TIMEOUT_MS"
        ));
    }

    #[test]
    fn test_invalid_bool() {
        let err = HttpServerConfigBuilder::from_lookup(lookup(&[("FLOWMESH_ENABLE_CORS", "maybe")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
    }

    #[test]
    fn test_zero_body_size_rejected() {
        let result = HttpServerConfigBuilder::new().max_body_size(0).build();
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("max_body_size must be greater than 0")
        );
    }

    #[test]
    fn test_zero_mailbox_rejected() {
        assert!(HttpServerConfigBuilder::new().mailbox_capacity(0).build().is_err());
    }
}
