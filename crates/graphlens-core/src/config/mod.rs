//! Configuration management for graphlens.
//!
//! Configuration is loaded from multiple sources with the following priority:
//! 1. Environment variables (highest priority)
//! 2. Project-local `graphlens.toml` file
//! 3. User config `~/.config/graphlens/config.toml`
//! 4. Built-in defaults (lowest priority)
//!
//! The result is resolved once at process start and handed to
//! [`DatabaseContext`](crate::DatabaseContext) and
//! [`QueryEngine`](crate::QueryEngine) by value.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod defaults;

pub use defaults::*;

use crate::context::is_valid_tenant_name;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph database connection settings.
    pub database: DatabaseConfig,

    /// Query execution settings.
    pub query: QueryConfig,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// Searches for config in order:
    /// 1. `./graphlens.toml` (project local)
    /// 2. `~/.config/graphlens/config.toml` (user config)
    /// 3. Falls back to defaults
    ///
    /// Environment overrides apply in every case.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(PROJECT_CONFIG_FILE).exists() {
            return Self::from_file(PROJECT_CONFIG_FILE);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE);
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("GRAPHLENS_DB_ENDPOINT") {
            self.database.endpoint = endpoint;
        }
        if let Some(namespace) = lookup("GRAPHLENS_DB_NAMESPACE") {
            self.database.namespace = namespace;
        }
        if let Some(tenant) = lookup("GRAPHLENS_DATABASE") {
            self.database.tenant = Some(tenant);
        }
        if let Some(user) = lookup("GRAPHLENS_DB_USER") {
            self.database.username = Some(user);
        }
        if let Some(password) = lookup("GRAPHLENS_DB_PASSWORD") {
            self.database.password = Some(password);
        }
        if let Some(timeout) = lookup("GRAPHLENS_QUERY_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.database.query_timeout_ms = ms;
            }
        }
    }

    /// Reject values that would only fail later at connection time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tenant) = self.database.tenant.as_deref() {
            if !tenant.is_empty() && !is_valid_tenant_name(tenant) {
                return Err(ConfigError::Invalid(format!(
                    "database.tenant '{}' must match ^[A-Za-z0-9_-]+$",
                    tenant
                )));
            }
        }
        if self.database.query_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.query_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.query.transitive_depth == 0 {
            return Err(ConfigError::Invalid(
                "query.transitive_depth must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Create a default config file content as a string.
    pub fn default_config_string() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Graph database connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Endpoint URL; the scheme selects the SurrealDB engine.
    pub endpoint: String,

    /// Namespace holding one database per tenant.
    pub namespace: String,

    /// Database used before any tenant switch.
    pub default_database: String,

    /// Process-wide default tenant. Unset or empty means no switch.
    pub tenant: Option<String>,

    /// Root user for remote endpoints.
    pub username: Option<String>,

    /// Root password (can also be set via environment variable).
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Time budget for one database round-trip, in milliseconds.
    pub query_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            default_database: DEFAULT_DATABASE.to_string(),
            tenant: None,
            username: Some(DEFAULT_USERNAME.to_string()),
            password: Some(DEFAULT_PASSWORD.to_string()),
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
        }
    }
}

impl DatabaseConfig {
    /// Per-call timeout as a [`Duration`].
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Resolve the tenant for a new connection.
    ///
    /// A non-empty override wins, then the configured tenant. `None` means
    /// the connection stays on the default context.
    pub fn resolve_tenant(&self, tenant_override: Option<&str>) -> Option<String> {
        tenant_override
            .filter(|t| !t.trim().is_empty())
            .or(self.tenant.as_deref().filter(|t| !t.trim().is_empty()))
            .map(|t| t.to_string())
    }

    /// Whether the endpoint talks to a server rather than an embedded engine.
    pub fn is_remote(&self) -> bool {
        ["ws://", "wss://", "http://", "https://"]
            .iter()
            .any(|scheme| self.endpoint.starts_with(scheme))
    }

    /// Root credentials to sign in with. Embedded engines never sign in.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        if !self.is_remote() {
            return None;
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some((username.as_str(), password.as_str())),
            _ => None,
        }
    }
}

/// Query execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Depth followed by dependency analysis when transitive edges are requested.
    pub transitive_depth: usize,

    /// Pause before retrying a timed-out query, in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            transitive_depth: DEFAULT_TRANSITIVE_DEPTH,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
        }
    }
}

impl QueryConfig {
    /// Retry backoff as a [`Duration`].
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.database.namespace, DEFAULT_NAMESPACE);
        assert!(config.database.tenant.is_none());
        assert_eq!(config.query.transitive_depth, DEFAULT_TRANSITIVE_DEPTH);
    }

    #[test]
    fn test_config_to_toml() {
        let mut config = Config::default();
        config.database.password = Some("secret".to_string());
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[database]"));
        assert!(toml_str.contains("[query]"));
        assert!(!toml_str.contains("secret"));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("GRAPHLENS_DATABASE", "tenant_a"),
            ("GRAPHLENS_DB_ENDPOINT", "mem://"),
            ("GRAPHLENS_QUERY_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.tenant.as_deref(), Some("tenant_a"));
        assert_eq!(config.database.endpoint, "mem://");
        assert_eq!(config.database.query_timeout_ms, DEFAULT_QUERY_TIMEOUT_MS);
    }

    #[test]
    fn test_resolve_tenant() {
        let mut db = DatabaseConfig::default();
        assert_eq!(db.resolve_tenant(None), None);
        assert_eq!(db.resolve_tenant(Some("  ")), None);

        db.tenant = Some("proj_a".to_string());
        assert_eq!(db.resolve_tenant(None).as_deref(), Some("proj_a"));
        assert_eq!(db.resolve_tenant(Some("proj_b")).as_deref(), Some("proj_b"));
        assert_eq!(db.resolve_tenant(Some("")).as_deref(), Some("proj_a"));
    }

    #[test]
    fn test_invalid_tenant_rejected() {
        let mut config = Config::default();
        config.database.tenant = Some("bad name;".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.database.tenant = Some(String::new());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_endpoint_detection() {
        let mut db = DatabaseConfig::default();
        assert!(db.is_remote());
        db.endpoint = "mem://".to_string();
        assert!(!db.is_remote());
        db.endpoint = "rocksdb://./graph.db".to_string();
        assert!(!db.is_remote());
    }
}
