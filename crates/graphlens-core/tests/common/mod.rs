#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graphlens_core::graph::{Direction, Edge, Entity, EntityKind, MemoryStore, Relation, Row};
use graphlens_core::{DatabaseContext, GraphSnapshot, GraphStore, MemoryServer, QueryConfig, QueryEngine, StoreError};
use serde_json::json;

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// A small project graph:
///
/// ```text
/// p.app    IMPORTS  p.util, p.models, ext.json
/// p.app    DEFINES  p.app.main, p.app.handle, p.app._setup
/// main  -> handle, parse      handle -> format
/// parse -> log                format -> log
/// Circle INHERITS Base        Circle IMPLEMENTS Shape
/// Square IMPLEMENTS Shape     SmallCircle INHERITS Circle
/// ```
pub fn project_graph() -> GraphSnapshot {
    GraphSnapshot::new()
        .entity(Entity::new(EntityKind::Project, "p"))
        .entity(Entity::new(EntityKind::Module, "p.app").with_location("app.py", 1, 80))
        .entity(Entity::new(EntityKind::Module, "p.util").with_location("util.py", 1, 40))
        .entity(Entity::new(EntityKind::Module, "p.models").with_location("models.py", 1, 120))
        .entity(Entity::new(EntityKind::ExternalPackage, "ext.json"))
        .entity(Entity::new(EntityKind::Function, "p.app.main").with_location("app.py", 10, 20))
        .entity(Entity::new(EntityKind::Function, "p.app.handle").with_location("app.py", 22, 30))
        .entity(Entity::new(EntityKind::Function, "p.app._setup").with_location("app.py", 32, 36))
        .entity(Entity::new(EntityKind::Function, "p.util.parse").with_location("util.py", 3, 9))
        .entity(Entity::new(EntityKind::Function, "p.util.format").with_location("util.py", 11, 18))
        .entity(Entity::new(EntityKind::Function, "p.util.log").with_location("util.py", 20, 24))
        .entity(Entity::new(EntityKind::Class, "p.models.Base").with_location("models.py", 5, 20))
        .entity(
            Entity::new(EntityKind::Class, "p.models.Shape")
                .with_property("is_abstract", json!(true)),
        )
        .entity(
            Entity::new(EntityKind::Class, "p.models.Circle")
                .with_property("base_classes", json!(["Base", "Shape"])),
        )
        .entity(Entity::new(EntityKind::Class, "p.models.Square"))
        .entity(Entity::new(EntityKind::Class, "p.models.SmallCircle"))
        .entity(Entity::new(EntityKind::Class, "p.models._Registry"))
        .entity(Entity::new(EntityKind::Class, "p.models.Orphan"))
        .entity(Entity::new(EntityKind::Function, "p.models.helper"))
        .entity(Entity::new(EntityKind::Method, "p.models.Circle.area"))
        .relate("p", Relation::Contains, "p.app")
        .relate("p", Relation::Contains, "p.util")
        .relate("p", Relation::Contains, "p.models")
        .relate("p.app", Relation::Imports, "p.util")
        .relate("p.app", Relation::Imports, "p.models")
        .relate("p.app", Relation::Imports, "ext.json")
        .relate("p.app", Relation::Defines, "p.app.main")
        .relate("p.app", Relation::Defines, "p.app.handle")
        .relate("p.app", Relation::Defines, "p.app._setup")
        .relate("p.util", Relation::Defines, "p.util.parse")
        .relate("p.util", Relation::Defines, "p.util.format")
        .relate("p.util", Relation::Defines, "p.util.log")
        .relate("p.models", Relation::Defines, "p.models.Base")
        .relate("p.models", Relation::Defines, "p.models.Shape")
        .relate("p.models", Relation::Defines, "p.models.Circle")
        .relate("p.models", Relation::Defines, "p.models.Square")
        .relate("p.models", Relation::Defines, "p.models.SmallCircle")
        .relate("p.models", Relation::Defines, "p.models._Registry")
        .relate("p.models", Relation::Defines, "p.models.helper")
        .relate("p.models.Circle", Relation::Defines, "p.models.Circle.area")
        .relate("p.app.main", Relation::Calls, "p.app.handle")
        .relate("p.app.main", Relation::Calls, "p.util.parse")
        .relate("p.app.handle", Relation::Calls, "p.util.format")
        .relate("p.util.parse", Relation::Calls, "p.util.log")
        .relate("p.util.format", Relation::Calls, "p.util.log")
        .relate("p.models.Circle", Relation::Inherits, "p.models.Base")
        .relate("p.models.Circle", Relation::Implements, "p.models.Shape")
        .relate("p.models.Square", Relation::Implements, "p.models.Shape")
        .relate("p.models.SmallCircle", Relation::Inherits, "p.models.Circle")
}

/// A second tenant reusing qualified names from [`project_graph`] with
/// different relationships.
pub fn other_graph() -> GraphSnapshot {
    GraphSnapshot::new()
        .entity(Entity::new(EntityKind::Function, "p.util.log"))
        .entity(Entity::new(EntityKind::Function, "p.other.only_here"))
        .relate("p.other.only_here", Relation::Calls, "p.util.log")
}

pub fn server() -> MemoryServer {
    MemoryServer::new()
        .with_database("proj", project_graph())
        .with_database("other", other_graph())
}

pub fn query_config() -> QueryConfig {
    QueryConfig {
        retry_backoff_ms: 1,
        ..QueryConfig::default()
    }
}

pub async fn engine(server: &MemoryServer, tenant: &str) -> QueryEngine {
    let context = DatabaseContext::bind(Arc::new(server.connect()), Some(tenant), TIMEOUT)
        .await
        .unwrap();
    QueryEngine::new(context, query_config())
}

pub async fn counting_engine(store: Arc<CountingStore>, timeout: Duration) -> QueryEngine {
    let context = DatabaseContext::bind(store, Some("proj"), timeout).await.unwrap();
    QueryEngine::new(context, query_config())
}

pub fn names(rows: &[Row]) -> Vec<&str> {
    rows.iter()
        .filter_map(|row| row.get("qualified_name").and_then(|v| v.as_str()))
        .collect()
}

/// Wraps a [`MemoryStore`], counting every query it receives.
///
/// `run` answers with scripted rows, and the first `stalls` edge lookups
/// sleep for `stall` before answering.
pub struct CountingStore {
    inner: MemoryStore,
    queries: AtomicUsize,
    run_rows: Vec<Row>,
    max_rows: AtomicUsize,
    stalls: AtomicUsize,
    stall: Duration,
}

impl CountingStore {
    pub fn new(server: &MemoryServer) -> Self {
        Self {
            inner: server.connect(),
            queries: AtomicUsize::new(0),
            run_rows: Vec::new(),
            max_rows: AtomicUsize::new(0),
            stalls: AtomicUsize::new(0),
            stall: Duration::ZERO,
        }
    }

    pub fn with_run_rows(mut self, rows: Vec<Row>) -> Self {
        self.run_rows = rows;
        self
    }

    pub fn stalling(mut self, times: usize, stall: Duration) -> Self {
        self.stalls = AtomicUsize::new(times);
        self.stall = stall;
        self
    }

    /// Queries received, excluding the tenant switch.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Row bound passed to the most recent `run`.
    pub fn max_rows(&self) -> usize {
        self.max_rows.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GraphStore for CountingStore {
    async fn use_database(&self, name: &str) -> Result<(), StoreError> {
        self.inner.use_database(name).await
    }

    async fn current_database(&self) -> Result<Option<String>, StoreError> {
        self.inner.current_database().await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn lookup(&self, qualified_name: &str, kinds: &[EntityKind]) -> Result<Option<Entity>, StoreError> {
        self.record();
        self.inner.lookup(qualified_name, kinds).await
    }

    async fn entities(&self, names: &[String]) -> Result<Vec<Entity>, StoreError> {
        self.record();
        self.inner.entities(names).await
    }

    async fn edges(
        &self,
        names: &[String],
        relations: &[Relation],
        direction: Direction,
    ) -> Result<Vec<Edge>, StoreError> {
        self.record();
        let stalled = self
            .stalls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stalled {
            tokio::time::sleep(self.stall).await;
        }
        self.inner.edges(names, relations, direction).await
    }

    async fn run(&self, _text: &str, _params: &Row, max_rows: usize) -> Result<Vec<Row>, StoreError> {
        self.record();
        self.max_rows.store(max_rows, Ordering::SeqCst);
        Ok(self.run_rows.iter().take(max_rows).cloned().collect())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.close().await
    }
}
