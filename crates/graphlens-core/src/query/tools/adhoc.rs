use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use crate::graph::Row;
use crate::query::envelope::Outcome;
use crate::query::guard::check_read_only;
use crate::query::validate::{require_identifier, require_range, AD_HOC_LIMIT};
use crate::query::verify::Target;
use crate::query::{QueryError, QueryKind, QueryTool};

/// Expert mode: caller-supplied read-only query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdHocQuery {
    pub query: String,
    /// Bound as `$name` parameters.
    #[serde(default)]
    pub parameters: Row,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

impl AdHocQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Row::new(),
            limit: default_limit(),
        }
    }

    pub fn with_parameters(mut self, parameters: Row) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl QueryTool for AdHocQuery {
    const KIND: QueryKind = QueryKind::AdHocQuery;

    fn validate(&self) -> Result<(), QueryError> {
        require_identifier("query", &self.query)?;
        require_range("limit", self.limit, &AD_HOC_LIMIT)
    }

    fn guard(&self) -> Result<(), QueryError> {
        check_read_only(&self.query)
    }

    fn target(&self) -> Option<Target<'_>> {
        None
    }

    /// Fetches one row past `limit`, so `total_count` is `limit + 1` when
    /// the result was cut short.
    async fn execute(&self, ctx: &DatabaseContext, _config: &QueryConfig) -> Result<Outcome, QueryError> {
        let limit = self.limit as usize;
        let mut rows = ctx.run(self.query.trim(), &self.parameters, limit + 1).await?;

        let total = rows.len();
        let truncated = total > limit;
        rows.truncate(limit);

        Ok(Outcome::new("Expert-mode query", rows).with_total(total, truncated))
    }
}
