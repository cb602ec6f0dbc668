//! Facade tying one tenant-bound context to the query operations.

use futures::future::join_all;
use serde_json::Value;
use tracing::{info, warn};

use super::envelope::{self, Envelope};
use super::{
    run_tool, AdHocQuery, CallGraph, ClassHierarchy, DependencyAnalysis, FindCallers, InterfaceImplementations,
    ModuleExports, QueryError, QueryRequest,
};
use crate::config::{Config, QueryConfig};
use crate::context::{DatabaseContext, HealthReport};

/// Query operations against one tenant.
///
/// Stateless apart from the bound context, so one engine can serve many
/// concurrent calls. Use a second engine for a second tenant.
#[derive(Debug)]
pub struct QueryEngine {
    context: DatabaseContext,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(context: DatabaseContext, config: QueryConfig) -> Self {
        Self { context, config }
    }

    /// Connect to the configured database and bind a tenant.
    pub async fn connect(config: &Config, tenant: Option<&str>) -> Result<Self, QueryError> {
        let context = DatabaseContext::connect(&config.database, tenant).await?;
        info!(
            endpoint = %config.database.endpoint,
            tenant = ?context.tenant(),
            "query engine ready"
        );
        Ok(Self::new(context, config.query.clone()))
    }

    pub fn context(&self) -> &DatabaseContext {
        &self.context
    }

    pub fn tenant(&self) -> Option<&str> {
        self.context.tenant()
    }

    pub async fn find_callers(&self, params: &FindCallers) -> Envelope {
        run_tool(params, &self.context, &self.config).await
    }

    pub async fn class_hierarchy(&self, params: &ClassHierarchy) -> Envelope {
        run_tool(params, &self.context, &self.config).await
    }

    pub async fn dependency_analysis(&self, params: &DependencyAnalysis) -> Envelope {
        run_tool(params, &self.context, &self.config).await
    }

    pub async fn interface_implementations(&self, params: &InterfaceImplementations) -> Envelope {
        run_tool(params, &self.context, &self.config).await
    }

    pub async fn call_graph(&self, params: &CallGraph) -> Envelope {
        run_tool(params, &self.context, &self.config).await
    }

    pub async fn module_exports(&self, params: &ModuleExports) -> Envelope {
        run_tool(params, &self.context, &self.config).await
    }

    pub async fn ad_hoc_query(&self, params: &AdHocQuery) -> Envelope {
        run_tool(params, &self.context, &self.config).await
    }

    pub async fn dispatch(&self, request: &QueryRequest) -> Envelope {
        match request {
            QueryRequest::FindCallers(params) => self.find_callers(params).await,
            QueryRequest::ClassHierarchy(params) => self.class_hierarchy(params).await,
            QueryRequest::DependencyAnalysis(params) => self.dependency_analysis(params).await,
            QueryRequest::InterfaceImplementations(params) => self.interface_implementations(params).await,
            QueryRequest::CallGraph(params) => self.call_graph(params).await,
            QueryRequest::ModuleExports(params) => self.module_exports(params).await,
            QueryRequest::AdHocQuery(params) => self.ad_hoc_query(params).await,
        }
    }

    /// Invoke an operation by tool name with JSON arguments.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Envelope {
        match QueryRequest::from_tool_call(name, arguments.clone()) {
            Ok(request) => self.dispatch(&request).await,
            Err(err) => {
                warn!(tool = name, error = %err, "tool call rejected");
                envelope::failure(err, arguments)
            }
        }
    }

    /// Run several requests concurrently. Each resolves to its own envelope,
    /// in request order; a failure never affects its siblings.
    pub async fn run_batch(&self, requests: &[QueryRequest]) -> Vec<Envelope> {
        join_all(requests.iter().map(|request| self.dispatch(request))).await
    }

    pub async fn health(&self) -> HealthReport {
        self.context.health_check().await
    }

    pub async fn close(self) -> Result<(), QueryError> {
        self.context.close().await
    }
}
