use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{EXPORTABLE, MODULE};
use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use crate::graph::{Direction, Relation, Row};
use crate::query::envelope::Outcome;
use crate::query::validate::require_identifier;
use crate::query::verify::Target;
use crate::query::{QueryError, QueryKind, QueryTool};

/// Functions, classes and methods a module defines.
///
/// Members whose name starts with `_` are private and hidden by default.
/// Ordering uses the first label only, never the whole label list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleExports {
    pub module_name: String,
    #[serde(default)]
    pub include_private: bool,
}

impl ModuleExports {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            include_private: false,
        }
    }

    pub fn with_private(mut self, include_private: bool) -> Self {
        self.include_private = include_private;
        self
    }
}

fn is_private(name: &str) -> bool {
    name.starts_with('_')
}

#[async_trait]
impl QueryTool for ModuleExports {
    const KIND: QueryKind = QueryKind::ModuleExports;

    fn validate(&self) -> Result<(), QueryError> {
        require_identifier("module_name", &self.module_name)
    }

    fn target(&self) -> Option<Target<'_>> {
        Some(Target::new(&self.module_name, MODULE))
    }

    async fn execute(&self, ctx: &DatabaseContext, _config: &QueryConfig) -> Result<Outcome, QueryError> {
        let module = self.module_name.trim().to_string();

        let mut names: Vec<String> = ctx
            .edges(std::slice::from_ref(&module), &[Relation::Defines], Direction::Outgoing)
            .await?
            .into_iter()
            .map(|edge| edge.dst)
            .collect();
        names.sort();
        names.dedup();

        let mut members = if names.is_empty() {
            Vec::new()
        } else {
            ctx.entities(&names).await?
        };
        members.retain(|e| e.is_any(EXPORTABLE) && (self.include_private || !is_private(&e.name)));
        members.sort_by(|a, b| {
            (a.primary_label(), &a.name, &a.qualified_name).cmp(&(b.primary_label(), &b.name, &b.qualified_name))
        });

        let rows: Vec<Row> = members
            .iter()
            .map(|member| {
                let mut row = member.to_row();
                let visibility = if is_private(&member.name) { "private" } else { "public" };
                row.insert("visibility".into(), json!(visibility));
                row
            })
            .collect();

        Ok(Outcome::new(
            format!(
                "{} members of {}",
                if self.include_private { "All" } else { "Public" },
                module
            ),
            rows,
        ))
    }
}
