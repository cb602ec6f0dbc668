//! Default values for graphlens configuration.
//!
//! All hardcoded defaults are centralized here for easy maintenance.

// ============================================================================
// Database Defaults
// ============================================================================

/// Default SurrealDB endpoint. The scheme selects the engine
/// (`ws://`, `http://`, `rocksdb://`, `mem://`).
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8000";

/// Namespace that holds one database per tenant.
pub const DEFAULT_NAMESPACE: &str = "codegraph";

/// Database used when no tenant is selected.
pub const DEFAULT_DATABASE: &str = "default";

/// Default root user for remote endpoints.
pub const DEFAULT_USERNAME: &str = "root";

/// Default root password for remote endpoints.
pub const DEFAULT_PASSWORD: &str = "root";

/// Time budget for a single database round-trip (30 seconds).
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Query Defaults
// ============================================================================

/// Depth used by dependency analysis when transitive edges are requested.
pub const DEFAULT_TRANSITIVE_DEPTH: usize = 5;

/// Pause before the single retry of a timed-out query.
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 250;

// ============================================================================
// File Locations
// ============================================================================

/// Project-local configuration file name.
pub const PROJECT_CONFIG_FILE: &str = "graphlens.toml";

/// Directory under the user config dir.
pub const USER_CONFIG_DIR: &str = "graphlens";

/// File name inside [`USER_CONFIG_DIR`].
pub const USER_CONFIG_FILE: &str = "config.toml";
