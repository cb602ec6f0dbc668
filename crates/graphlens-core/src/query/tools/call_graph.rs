use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{annotate, CALLABLE};
use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use crate::graph::{Direction, Relation};
use crate::query::envelope::Outcome;
use crate::query::traverse::{hydrate, Traversal};
use crate::query::validate::{require_identifier, require_range, CALL_GRAPH_DEPTH, CALL_GRAPH_NODES};
use crate::query::verify::Target;
use crate::query::{QueryError, QueryKind, QueryTool};

/// Functions reachable from an entry point over CALLS.
///
/// Bounded by depth and by node count, whichever is hit first. Hitting the
/// node cap sets `truncated` and reports the discovered count as `total_count`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallGraph {
    pub entry_point: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: i64,
}

fn default_max_depth() -> i64 {
    3
}

fn default_max_nodes() -> i64 {
    50
}

impl CallGraph {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            entry_point: entry_point.into(),
            max_depth: default_max_depth(),
            max_nodes: default_max_nodes(),
        }
    }

    pub fn with_max_depth(mut self, max_depth: i64) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: i64) -> Self {
        self.max_nodes = max_nodes;
        self
    }
}

#[async_trait]
impl QueryTool for CallGraph {
    const KIND: QueryKind = QueryKind::CallGraph;

    fn validate(&self) -> Result<(), QueryError> {
        require_identifier("entry_point", &self.entry_point)?;
        require_range("max_depth", self.max_depth, &CALL_GRAPH_DEPTH)?;
        require_range("max_nodes", self.max_nodes, &CALL_GRAPH_NODES)
    }

    fn target(&self) -> Option<Target<'_>> {
        Some(Target::new(&self.entry_point, CALLABLE))
    }

    async fn execute(&self, ctx: &DatabaseContext, _config: &QueryConfig) -> Result<Outcome, QueryError> {
        let entry = self.entry_point.trim();
        let walk = Traversal::from(entry, &[Relation::Calls], Direction::Outgoing)
            .depth(self.max_depth as usize)
            .node_cap(self.max_nodes as usize)
            .run(ctx)
            .await?;

        let mut rows = hydrate(ctx, &walk.visits).await?;
        annotate(&mut rows, &walk.visits, "called_from");

        Ok(Outcome::new(
            format!(
                "Call graph from {} (depth {}, at most {} nodes)",
                entry, self.max_depth, self.max_nodes
            ),
            rows,
        )
        .with_total(walk.total, walk.truncated))
    }
}
