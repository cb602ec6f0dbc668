//! Structural queries over the code knowledge graph.
//!
//! Every operation runs the same pipeline:
//!
//! 1. validate parameters (synchronous, no I/O)
//! 2. run the read-only guard (expert mode only)
//! 3. execute the traversal, retrying once on timeout
//! 4. on an empty result, verify the target exists
//! 5. format a success or error [`Envelope`]
//!
//! Steps 1, 2 and 5 never suspend; only the store calls in 3 and 4 do.

pub mod engine;
pub mod envelope;
mod error;
pub mod guard;
pub mod schema;
pub mod tools;
pub mod traverse;
pub mod validate;
pub mod verify;

pub use engine::QueryEngine;
pub use envelope::{Envelope, ErrorEnvelope, Metadata, Outcome, QueryResult};
pub use error::{ErrorKind, QueryError};
pub use schema::{tool_specs, ToolSpec};
pub use tools::{
    AdHocQuery, CallGraph, ClassHierarchy, DependencyAnalysis, FindCallers, InterfaceImplementations,
    ModuleExports,
};

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use verify::Target;

/// The seven query operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    FindCallers,
    ClassHierarchy,
    DependencyAnalysis,
    InterfaceImplementations,
    CallGraph,
    ModuleExports,
    AdHocQuery,
}

impl QueryKind {
    pub const ALL: [QueryKind; 7] = [
        QueryKind::FindCallers,
        QueryKind::ClassHierarchy,
        QueryKind::DependencyAnalysis,
        QueryKind::InterfaceImplementations,
        QueryKind::CallGraph,
        QueryKind::ModuleExports,
        QueryKind::AdHocQuery,
    ];

    /// Name the operation is invoked by as a tool.
    pub fn tool_name(&self) -> &'static str {
        match self {
            QueryKind::FindCallers => "find_callers",
            QueryKind::ClassHierarchy => "class_hierarchy",
            QueryKind::DependencyAnalysis => "dependency_analysis",
            QueryKind::InterfaceImplementations => "interface_implementations",
            QueryKind::CallGraph => "call_graph",
            QueryKind::ModuleExports => "module_exports",
            QueryKind::AdHocQuery => "ad_hoc_query",
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tool_name() == name)
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// One query operation: its parameters plus how to run them.
#[async_trait]
pub trait QueryTool: Serialize + Send + Sync {
    const KIND: QueryKind;

    /// Check parameters. Must not touch the database.
    fn validate(&self) -> Result<(), QueryError>;

    /// Security checks run after validation, before any I/O.
    fn guard(&self) -> Result<(), QueryError> {
        Ok(())
    }

    /// Entity whose existence explains an empty result, if any.
    fn target(&self) -> Option<Target<'_>>;

    /// Run the traversal. Only called on validated parameters.
    async fn execute(&self, ctx: &DatabaseContext, config: &QueryConfig) -> Result<Outcome, QueryError>;
}

/// Run a tool through the full pipeline. Never fails; errors become envelopes.
pub async fn run_tool<T: QueryTool>(tool: &T, ctx: &DatabaseContext, config: &QueryConfig) -> Envelope {
    let started = Instant::now();
    debug!(kind = %T::KIND, tenant = ?ctx.tenant(), "query started");

    match pipeline(tool, ctx, config).await {
        Ok(outcome) => {
            let envelope = envelope::success(T::KIND, outcome, started.elapsed());
            if let Some(result) = envelope.success() {
                debug!(
                    kind = %T::KIND,
                    rows = result.metadata.row_count,
                    truncated = result.metadata.truncated,
                    "query finished"
                );
            }
            envelope
        }
        Err(err) => {
            warn!(kind = %T::KIND, error_kind = ?err.kind(), error = %err, "query failed");
            let input = serde_json::to_value(tool).unwrap_or(Value::Null);
            envelope::failure(err, input)
        }
    }
}

async fn pipeline<T: QueryTool>(tool: &T, ctx: &DatabaseContext, config: &QueryConfig) -> Result<Outcome, QueryError> {
    tool.validate()?;
    tool.guard()?;

    let outcome = match tool.execute(ctx, config).await {
        Err(err) if err.kind().is_retryable() => {
            warn!(kind = %T::KIND, error = %err, "query timed out, retrying once");
            tokio::time::sleep(config.retry_backoff()).await;
            tool.execute(ctx, config).await?
        }
        result => result?,
    };

    if outcome.is_empty() {
        if let Some(target) = tool.target() {
            verify::ensure_exists(ctx, target).await?;
        }
    }
    Ok(outcome)
}

/// A request for any of the seven operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tool", content = "arguments", rename_all = "snake_case")]
pub enum QueryRequest {
    FindCallers(FindCallers),
    ClassHierarchy(ClassHierarchy),
    DependencyAnalysis(DependencyAnalysis),
    InterfaceImplementations(InterfaceImplementations),
    CallGraph(CallGraph),
    ModuleExports(ModuleExports),
    AdHocQuery(AdHocQuery),
}

impl QueryRequest {
    pub fn kind(&self) -> QueryKind {
        match self {
            QueryRequest::FindCallers(_) => QueryKind::FindCallers,
            QueryRequest::ClassHierarchy(_) => QueryKind::ClassHierarchy,
            QueryRequest::DependencyAnalysis(_) => QueryKind::DependencyAnalysis,
            QueryRequest::InterfaceImplementations(_) => QueryKind::InterfaceImplementations,
            QueryRequest::CallGraph(_) => QueryKind::CallGraph,
            QueryRequest::ModuleExports(_) => QueryKind::ModuleExports,
            QueryRequest::AdHocQuery(_) => QueryKind::AdHocQuery,
        }
    }

    /// Decode a named tool call. A missing or null argument object means
    /// all defaults.
    pub fn from_tool_call(name: &str, arguments: Value) -> Result<Self, QueryError> {
        let kind = QueryKind::from_tool_name(name.trim()).ok_or_else(|| {
            let known: Vec<&str> = QueryKind::ALL.iter().map(|k| k.tool_name()).collect();
            QueryError::invalid(format!("Unknown tool '{}'. Available tools: {}", name, known.join(", ")))
        })?;

        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        fn decode<T: serde::de::DeserializeOwned>(kind: QueryKind, arguments: Value) -> Result<T, QueryError> {
            serde_json::from_value(arguments)
                .map_err(|e| QueryError::invalid(format!("Invalid arguments for {}: {}", kind, e)))
        }

        Ok(match kind {
            QueryKind::FindCallers => QueryRequest::FindCallers(decode(kind, arguments)?),
            QueryKind::ClassHierarchy => QueryRequest::ClassHierarchy(decode(kind, arguments)?),
            QueryKind::DependencyAnalysis => QueryRequest::DependencyAnalysis(decode(kind, arguments)?),
            QueryKind::InterfaceImplementations => {
                QueryRequest::InterfaceImplementations(decode(kind, arguments)?)
            }
            QueryKind::CallGraph => QueryRequest::CallGraph(decode(kind, arguments)?),
            QueryKind::ModuleExports => QueryRequest::ModuleExports(decode(kind, arguments)?),
            QueryKind::AdHocQuery => QueryRequest::AdHocQuery(decode(kind, arguments)?),
        })
    }
}
