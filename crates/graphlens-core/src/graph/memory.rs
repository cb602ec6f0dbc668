//! In-process graph backend.
//!
//! A [`MemoryServer`] hosts several named databases; each [`MemoryStore`]
//! is one connection to it with its own active database, the same way a
//! SurrealDB client connection is bound to one database at a time.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::model::{Direction, Edge, Entity, EntityKind, Relation, Row};
use super::GraphStore;
use crate::config::DEFAULT_DATABASE;

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Serializable contents of one tenant database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity.
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add an edge `src -[kind]-> dst`.
    pub fn relate(mut self, src: &str, kind: Relation, dst: &str) -> Self {
        self.relationships.push(Edge::new(src, kind, dst));
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_json_str(&content)
    }
}

// =============================================================================
// GRAPH
// =============================================================================

#[derive(Debug, Default)]
struct MemoryGraph {
    entities: BTreeMap<String, Entity>,
    edges: Vec<Edge>,
    outgoing: HashMap<String, Vec<usize>>,
    incoming: HashMap<String, Vec<usize>>,
}

impl MemoryGraph {
    fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut graph = MemoryGraph::default();
        for entity in snapshot.entities {
            graph.entities.insert(entity.qualified_name.clone(), entity);
        }

        let mut edges = snapshot.relationships;
        edges.sort();
        edges.dedup();
        for (idx, edge) in edges.iter().enumerate() {
            graph.outgoing.entry(edge.src.clone()).or_default().push(idx);
            graph.incoming.entry(edge.dst.clone()).or_default().push(idx);
        }
        graph.edges = edges;
        graph
    }

    fn hop(&self, names: &[String], relations: &[Relation], direction: Direction) -> Vec<Edge> {
        let index = match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        };

        names
            .iter()
            .filter_map(|name| index.get(name))
            .flatten()
            .map(|&idx| &self.edges[idx])
            .filter(|edge| relations.contains(&edge.kind))
            .cloned()
            .collect()
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// Host for named in-memory databases. Cloning shares the databases.
#[derive(Clone)]
pub struct MemoryServer {
    databases: Arc<RwLock<BTreeMap<String, Arc<MemoryGraph>>>>,
}

impl Default for MemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryServer {
    /// Create a server with an empty default database.
    pub fn new() -> Self {
        let mut databases = BTreeMap::new();
        databases.insert(DEFAULT_DATABASE.to_string(), Arc::new(MemoryGraph::default()));
        Self {
            databases: Arc::new(RwLock::new(databases)),
        }
    }

    /// Create or replace a database.
    pub fn insert_database(&self, name: impl Into<String>, snapshot: GraphSnapshot) {
        let graph = Arc::new(MemoryGraph::from_snapshot(snapshot));
        let mut databases = match self.databases.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        databases.insert(name.into(), graph);
    }

    /// Builder form of [`insert_database`](Self::insert_database).
    pub fn with_database(self, name: impl Into<String>, snapshot: GraphSnapshot) -> Self {
        self.insert_database(name, snapshot);
        self
    }

    /// Open a connection on the default database.
    pub fn connect(&self) -> MemoryStore {
        MemoryStore {
            server: self.clone(),
            active: RwLock::new(DEFAULT_DATABASE.to_string()),
            closed: AtomicBool::new(false),
        }
    }

    fn database(&self, name: &str) -> Result<Option<Arc<MemoryGraph>>, StoreError> {
        let databases = self
            .databases
            .read()
            .map_err(|_| StoreError::Database("memory server lock poisoned".to_string()))?;
        Ok(databases.get(name).cloned())
    }
}

// =============================================================================
// CONNECTION
// =============================================================================

/// One connection to a [`MemoryServer`].
pub struct MemoryStore {
    server: MemoryServer,
    active: RwLock<String>,
    closed: AtomicBool,
}

impl MemoryStore {
    fn graph(&self) -> Result<Arc<MemoryGraph>, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Connection("connection is closed".to_string()));
        }
        let active = self
            .active
            .read()
            .map_err(|_| StoreError::Database("connection state lock poisoned".to_string()))?
            .clone();
        self.server
            .database(&active)?
            .ok_or(StoreError::DatabaseNotFound(active))
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn use_database(&self, name: &str) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Connection("connection is closed".to_string()));
        }
        if self.server.database(name)?.is_none() {
            return Err(StoreError::DatabaseNotFound(name.to_string()));
        }
        let mut active = self
            .active
            .write()
            .map_err(|_| StoreError::Database("connection state lock poisoned".to_string()))?;
        *active = name.to_string();
        Ok(())
    }

    async fn current_database(&self) -> Result<Option<String>, StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Connection("connection is closed".to_string()));
        }
        let active = self
            .active
            .read()
            .map_err(|_| StoreError::Database("connection state lock poisoned".to_string()))?;
        Ok(Some(active.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.graph().map(|_| ())
    }

    async fn lookup(
        &self,
        qualified_name: &str,
        kinds: &[EntityKind],
    ) -> Result<Option<Entity>, StoreError> {
        let graph = self.graph()?;
        Ok(graph
            .entities
            .get(qualified_name)
            .filter(|entity| kinds.is_empty() || entity.is_any(kinds))
            .cloned())
    }

    async fn entities(&self, names: &[String]) -> Result<Vec<Entity>, StoreError> {
        let graph = self.graph()?;
        Ok(names
            .iter()
            .filter_map(|name| graph.entities.get(name))
            .cloned()
            .collect())
    }

    async fn edges(
        &self,
        names: &[String],
        relations: &[Relation],
        direction: Direction,
    ) -> Result<Vec<Edge>, StoreError> {
        let graph = self.graph()?;
        Ok(graph.hop(names, relations, direction))
    }

    async fn run(&self, _text: &str, _params: &Row, _max_rows: usize) -> Result<Vec<Row>, StoreError> {
        Err(StoreError::Unsupported(
            "query text requires a SurrealDB backend".to_string(),
        ))
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
