pub mod config;
pub mod context;
pub mod graph;
pub mod query;

pub use config::{Config, ConfigError, DatabaseConfig, QueryConfig};
pub use context::{DatabaseContext, HealthReport};
pub use graph::{GraphSnapshot, GraphStore, MemoryServer, StoreError, SurrealStore};
pub use query::{
    tool_specs, AdHocQuery, CallGraph, ClassHierarchy, DependencyAnalysis, Envelope, ErrorKind, FindCallers,
    InterfaceImplementations, ModuleExports, QueryEngine, QueryError, QueryKind, QueryRequest, ToolSpec,
};
