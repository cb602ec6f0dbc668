//! Tenant-bound database connections.
//!
//! A [`DatabaseContext`] owns one [`GraphStore`] connection and binds it to at
//! most one tenant for its whole lifetime. There is no way to switch an open
//! context to another tenant; open a second context instead.

use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::graph::{Direction, Edge, Entity, EntityKind, GraphStore, Relation, Row, StoreError, SurrealStore};
use crate::query::QueryError;

fn tenant_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").ok())
        .as_ref()
}

/// Whether `name` is an acceptable tenant database name.
pub fn is_valid_tenant_name(name: &str) -> bool {
    match tenant_pattern() {
        Some(re) => re.is_match(name),
        None => false,
    }
}

/// Validate a tenant name before it is sent to the database.
pub fn validate_tenant_name(name: &str) -> Result<(), QueryError> {
    if !is_valid_tenant_name(name) {
        return Err(QueryError::invalid(format!(
            "Invalid database name '{}': only letters, digits, '_' and '-' are allowed",
            name
        )));
    }
    Ok(())
}

/// Outcome of a readiness probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    /// Raw connectivity succeeded.
    pub connected: bool,
    /// Tenant this context is bound to, if any.
    pub tenant: Option<String>,
    /// The connection is on the expected database.
    pub tenant_active: bool,
    /// Database the connection reports as active.
    pub active_database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.connected && self.tenant_active
    }
}

/// A connection bound to one tenant.
pub struct DatabaseContext {
    store: Arc<dyn GraphStore>,
    tenant: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for DatabaseContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseContext")
            .field("tenant", &self.tenant)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DatabaseContext {
    /// Connect to SurrealDB and bind the resolved tenant.
    ///
    /// `tenant_override` wins over the configured tenant; if neither is set
    /// the connection stays on the default database.
    pub async fn connect(config: &DatabaseConfig, tenant_override: Option<&str>) -> Result<Self, QueryError> {
        let tenant = config.resolve_tenant(tenant_override);
        if let Some(name) = tenant.as_deref() {
            validate_tenant_name(name)?;
        }

        let store = SurrealStore::connect(config).await.map_err(|e| {
            QueryError::connection(tenant.as_deref().unwrap_or(&config.default_database), e.to_string())
        })?;

        Self::bind(Arc::new(store), tenant.as_deref(), config.query_timeout()).await
    }

    /// Bind an already-open store to `tenant`.
    ///
    /// The context switch is issued before anything else runs on the
    /// connection. If it fails the connection is closed and a
    /// [`QueryError::Connection`] is returned; it never falls back to the
    /// default database.
    pub async fn bind(
        store: Arc<dyn GraphStore>,
        tenant: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, QueryError> {
        let tenant = tenant.map(str::trim).filter(|t| !t.is_empty());

        if let Some(name) = tenant {
            validate_tenant_name(name)?;

            let switched = match tokio::time::timeout(timeout, store.use_database(name)).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(timeout)),
            };

            if let Err(err) = switched {
                warn!(tenant = name, error = %err, "tenant activation failed, closing connection");
                if let Err(close_err) = store.close().await {
                    warn!(error = %close_err, "failed to close connection after activation failure");
                }
                return Err(QueryError::connection(name, err.to_string()));
            }
            info!(tenant = name, "database context activated");
        }

        Ok(Self {
            store,
            tenant: tenant.map(str::to_string),
            timeout,
        })
    }

    /// Tenant this context is bound to. `None` is the default database.
    pub fn tenant(&self) -> Option<&str> {
        self.tenant.as_deref()
    }

    /// Per-call time budget.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Check connectivity and that the tenant switch is in effect.
    pub async fn health_check(&self) -> HealthReport {
        let mut report = HealthReport {
            connected: false,
            tenant: self.tenant.clone(),
            tenant_active: false,
            active_database: None,
            error: None,
        };

        if let Err(err) = self.guarded(self.store.ping()).await {
            report.error = Some(err.to_string());
            return report;
        }
        report.connected = true;

        match self.guarded(self.store.current_database()).await {
            Ok(active) => {
                report.tenant_active = match (&self.tenant, &active) {
                    (Some(tenant), Some(active)) => tenant == active,
                    (Some(_), None) => false,
                    (None, active) => active.is_some(),
                };
                report.active_database = active;
            }
            Err(err) => report.error = Some(err.to_string()),
        }

        if report.connected && !report.tenant_active && report.error.is_none() {
            report.error = Some("connection is not on the expected database".to_string());
        }
        report
    }

    /// Close the underlying connection.
    pub async fn close(self) -> Result<(), QueryError> {
        self.store
            .close()
            .await
            .map_err(|e| self.map_error(e))
    }

    pub(crate) async fn lookup(&self, name: &str, kinds: &[EntityKind]) -> Result<Option<Entity>, QueryError> {
        self.guarded(self.store.lookup(name, kinds))
            .await
            .map_err(|e| self.map_error(e))
    }

    pub(crate) async fn entities(&self, names: &[String]) -> Result<Vec<Entity>, QueryError> {
        self.guarded(self.store.entities(names))
            .await
            .map_err(|e| self.map_error(e))
    }

    pub(crate) async fn edges(
        &self,
        names: &[String],
        relations: &[Relation],
        direction: Direction,
    ) -> Result<Vec<Edge>, QueryError> {
        self.guarded(self.store.edges(names, relations, direction))
            .await
            .map_err(|e| self.map_error(e))
    }

    pub(crate) async fn run(&self, text: &str, params: &Row, max_rows: usize) -> Result<Vec<Row>, QueryError> {
        self.guarded(self.store.run(text, params, max_rows))
            .await
            .map_err(|e| self.map_error(e))
    }

    async fn guarded<T>(&self, call: impl Future<Output = Result<T, StoreError>>) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    /// Map a backend failure into the caller-facing taxonomy.
    fn map_error(&self, err: StoreError) -> QueryError {
        match err {
            StoreError::Timeout(budget) => QueryError::Timeout {
                timeout_ms: budget.as_millis() as u64,
            },
            StoreError::Connection(message) | StoreError::DatabaseNotFound(message) => {
                QueryError::connection(self.tenant.as_deref().unwrap_or("default"), message)
            }
            other => {
                error!(tenant = ?self.tenant, error = %other, "graph query failed");
                QueryError::Unknown("The graph database could not complete the query".to_string())
            }
        }
    }
}
