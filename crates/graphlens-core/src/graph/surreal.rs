//! SurrealDB backend for the code graph.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::debug;

use super::error::StoreError;
use super::model::{Direction, Edge, Entity, EntityKind, Relation, Row};
use super::GraphStore;
use crate::config::DatabaseConfig;

const ENTITY_FIELDS: &str = "qualified_name, name, labels, file_path, line_start, line_end, properties";

/// Connection to a SurrealDB instance.
///
/// Tenants are databases inside one namespace. The expected tables are
/// `entity` (one record per code entity) and `relation` (`src`, `dst`, `kind`),
/// both keyed by qualified name.
pub struct SurrealStore {
    db: Surreal<Any>,
    namespace: String,
    database: Mutex<Option<String>>,
    closed: AtomicBool,
}

impl SurrealStore {
    /// Connect to the configured endpoint and select the default context.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let db = any::connect(config.endpoint.as_str())
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {}", config.endpoint, e)))?;

        if let Some((username, password)) = config.credentials() {
            db.signin(Root { username, password })
                .await
                .map_err(|e| StoreError::Connection(format!("sign-in failed: {}", e)))?;
        }

        debug!(endpoint = %config.endpoint, namespace = %config.namespace, "connected to SurrealDB");
        Self::with_client(db, config).await
    }

    /// Wrap an already connected client, selecting the configured namespace
    /// and default database.
    pub async fn with_client(db: Surreal<Any>, config: &DatabaseConfig) -> Result<Self, StoreError> {
        db.use_ns(config.namespace.as_str())
            .use_db(config.default_database.as_str())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            db,
            namespace: config.namespace.clone(),
            database: Mutex::new(Some(config.default_database.clone())),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Connection("connection is closed".to_string()));
        }
        Ok(())
    }

    /// Names of the databases defined in this namespace.
    async fn list_databases(&self) -> Result<Vec<String>, StoreError> {
        #[derive(serde::Deserialize)]
        struct NamespaceInfo {
            #[serde(default)]
            databases: BTreeMap<String, Value>,
        }

        let info: Option<NamespaceInfo> = self.db.query("INFO FOR NS").await?.take(0)?;
        Ok(info
            .map(|i| i.databases.into_keys().collect())
            .unwrap_or_default())
    }
}

fn kind_labels(kinds: &[EntityKind]) -> Vec<String> {
    kinds.iter().map(|k| k.as_str().to_string()).collect()
}

fn relation_names(relations: &[Relation]) -> Vec<String> {
    relations.iter().map(|r| r.as_str().to_string()).collect()
}

/// Wrap a single `SELECT` so the database stops after `max_rows` rows.
///
/// Anything else runs as written and is cut down after the fact.
fn bounded_statement(text: &str, max_rows: usize) -> String {
    let statement = text.trim().trim_end_matches(';').trim_end();
    let is_select = statement
        .get(..7)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT "));
    if is_select && !statement.contains(';') {
        format!("SELECT * FROM ({}) LIMIT {}", statement, max_rows)
    } else {
        text.to_string()
    }
}

fn into_row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => {
            let mut row = Row::new();
            row.insert("value".to_string(), other);
            row
        }
    }
}

#[async_trait]
impl GraphStore for SurrealStore {
    async fn use_database(&self, name: &str) -> Result<(), StoreError> {
        self.ensure_open()?;

        // use_db alone would silently target an empty database
        let databases = self.list_databases().await?;
        if !databases.iter().any(|db| db == name) {
            return Err(StoreError::DatabaseNotFound(format!("{}/{}", self.namespace, name)));
        }

        self.db.use_db(name).await?;
        if let Ok(mut current) = self.database.lock() {
            *current = Some(name.to_string());
        }
        Ok(())
    }

    async fn current_database(&self) -> Result<Option<String>, StoreError> {
        self.ensure_open()?;
        self.database
            .lock()
            .map(|current| current.clone())
            .map_err(|_| StoreError::Database("database state lock poisoned".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.db
            .health()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }

    async fn lookup(
        &self,
        qualified_name: &str,
        kinds: &[EntityKind],
    ) -> Result<Option<Entity>, StoreError> {
        self.ensure_open()?;

        let query = if kinds.is_empty() {
            format!("SELECT {} FROM entity WHERE qualified_name = $name LIMIT 1", ENTITY_FIELDS)
        } else {
            format!(
                "SELECT {} FROM entity WHERE qualified_name = $name AND labels CONTAINSANY $kinds LIMIT 1",
                ENTITY_FIELDS
            )
        };

        let found: Vec<Entity> = self
            .db
            .query(query)
            .bind(("name", qualified_name.to_string()))
            .bind(("kinds", kind_labels(kinds)))
            .await?
            .take(0)?;

        Ok(found.into_iter().next())
    }

    async fn entities(&self, names: &[String]) -> Result<Vec<Entity>, StoreError> {
        self.ensure_open()?;
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {} FROM entity WHERE qualified_name IN $names", ENTITY_FIELDS);
        let results: Vec<Entity> = self
            .db
            .query(query)
            .bind(("names", names.to_vec()))
            .await?
            .take(0)?;

        Ok(results)
    }

    async fn edges(
        &self,
        names: &[String],
        relations: &[Relation],
        direction: Direction,
    ) -> Result<Vec<Edge>, StoreError> {
        self.ensure_open()?;
        if names.is_empty() || relations.is_empty() {
            return Ok(Vec::new());
        }

        let query = match direction {
            Direction::Outgoing => "SELECT src, dst, kind FROM relation WHERE src IN $names AND kind IN $kinds",
            Direction::Incoming => "SELECT src, dst, kind FROM relation WHERE dst IN $names AND kind IN $kinds",
        };

        let results: Vec<Edge> = self
            .db
            .query(query)
            .bind(("names", names.to_vec()))
            .bind(("kinds", relation_names(relations)))
            .await?
            .take(0)?;

        Ok(results)
    }

    async fn run(&self, text: &str, params: &Row, max_rows: usize) -> Result<Vec<Row>, StoreError> {
        self.ensure_open()?;

        let mut query = self.db.query(bounded_statement(text, max_rows));
        if !params.is_empty() {
            query = query.bind(params.clone());
        }

        let mut rows: Vec<Value> = query.await?.take(0)?;
        rows.truncate(max_rows);
        Ok(rows.into_iter().map(into_row).collect())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Ok(mut current) = self.database.lock() {
            *current = None;
        }
        self.db.invalidate().await?;
        Ok(())
    }
}
