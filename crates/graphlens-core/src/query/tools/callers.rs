use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{annotate, default_true, CALLABLE};
use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use crate::graph::{Direction, Relation};
use crate::query::envelope::Outcome;
use crate::query::traverse::{hydrate, Traversal};
use crate::query::validate::{require_identifier, require_range, CALLER_DEPTH};
use crate::query::verify::Target;
use crate::query::{QueryError, QueryKind, QueryTool};

/// Who calls a function or method, walking CALLS backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FindCallers {
    /// Qualified name of the callee.
    pub function_name: String,
    /// 1 returns direct callers only.
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
    /// Attach the call chain `caller -> ... -> target` to each row.
    #[serde(default = "default_true")]
    pub include_paths: bool,
}

fn default_max_depth() -> i64 {
    1
}

impl FindCallers {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            max_depth: default_max_depth(),
            include_paths: true,
        }
    }

    pub fn with_max_depth(mut self, max_depth: i64) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_paths(mut self, include_paths: bool) -> Self {
        self.include_paths = include_paths;
        self
    }
}

#[async_trait]
impl QueryTool for FindCallers {
    const KIND: QueryKind = QueryKind::FindCallers;

    fn validate(&self) -> Result<(), QueryError> {
        require_identifier("function_name", &self.function_name)?;
        require_range("max_depth", self.max_depth, &CALLER_DEPTH)
    }

    fn target(&self) -> Option<Target<'_>> {
        Some(Target::new(&self.function_name, CALLABLE))
    }

    async fn execute(&self, ctx: &DatabaseContext, _config: &QueryConfig) -> Result<Outcome, QueryError> {
        let target = self.function_name.trim();
        let walk = Traversal::from(target, &[Relation::Calls], Direction::Incoming)
            .depth(self.max_depth as usize)
            .run(ctx)
            .await?;

        let mut rows = hydrate(ctx, &walk.visits).await?;
        annotate(&mut rows, &walk.visits, "calls");
        if self.include_paths {
            for (row, visit) in rows.iter_mut().zip(&walk.visits) {
                row.insert("path".into(), json!(walk.path_to_start(&visit.name)));
            }
        }

        Ok(Outcome::new(
            format!("Callers of {} up to depth {}", target, self.max_depth),
            rows,
        ))
    }
}
