//! Read-only access to the code knowledge graph.
//!
//! # Components
//!
//! - [`GraphStore`] - the connection interface every backend implements
//! - [`SurrealStore`] - SurrealDB backend; tenants are databases in one namespace
//! - [`MemoryServer`] / [`MemoryStore`] - in-process graphs, one per tenant
//!
//! # Storage layout
//!
//! - **Entities**: Project, Module, Class, Function, Method, ExternalPackage
//! - **Edges**: CONTAINS, DEFINES, IMPORTS, CALLS, INHERITS, IMPLEMENTS
//!
//! Both are keyed by qualified name. Nothing in this module writes to a
//! database; graphs are populated by the ingestion pipeline.

mod error;
mod memory;
mod model;
mod surreal;

pub use error::StoreError;
pub use memory::{GraphSnapshot, MemoryServer, MemoryStore};
pub use model::{display_name, dangling_row, Direction, Edge, Entity, EntityKind, Relation, Row};
pub use surreal::SurrealStore;

use async_trait::async_trait;

/// A connection to a graph database.
///
/// Every method is a suspension point. Implementations must be read-only:
/// the only state a connection may change is its own active database.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Switch this connection's context to the named tenant database.
    ///
    /// Fails if the database does not exist.
    async fn use_database(&self, name: &str) -> Result<(), StoreError>;

    /// Name of the database this connection currently targets.
    async fn current_database(&self) -> Result<Option<String>, StoreError>;

    /// Raw connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Find an entity by qualified name, restricted to `kinds`.
    ///
    /// An empty `kinds` slice matches any kind.
    async fn lookup(
        &self,
        qualified_name: &str,
        kinds: &[EntityKind],
    ) -> Result<Option<Entity>, StoreError>;

    /// Fetch entities for a batch of qualified names. Unknown names are skipped.
    async fn entities(&self, names: &[String]) -> Result<Vec<Entity>, StoreError>;

    /// One traversal hop: edges of `relations` leaving (`Outgoing`) or
    /// entering (`Incoming`) any of `names`.
    async fn edges(
        &self,
        names: &[String],
        relations: &[Relation],
        direction: Direction,
    ) -> Result<Vec<Edge>, StoreError>;

    /// Execute caller-supplied query text with bound parameters.
    ///
    /// Returns at most `max_rows` rows. Backends push the bound into the
    /// query where the statement allows it.
    async fn run(&self, text: &str, params: &Row, max_rows: usize) -> Result<Vec<Row>, StoreError>;

    /// Tear the connection down. Later calls fail with [`StoreError::Connection`].
    async fn close(&self) -> Result<(), StoreError>;
}
