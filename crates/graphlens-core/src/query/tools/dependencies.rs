use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{annotate, DEPENDENCY_TARGET};
use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use crate::graph::{Direction, Relation, Row};
use crate::query::envelope::Outcome;
use crate::query::traverse::{hydrate, Traversal};
use crate::query::validate::{parse_choice, require_identifier, DependencyType};
use crate::query::verify::Target;
use crate::query::{QueryError, QueryKind, QueryTool};

/// What a module or function depends on, via IMPORTS and/or CALLS.
///
/// For a module, calls made by the functions and methods it defines count as
/// the module's calls. In `all` mode both subsets are returned and the row
/// count is their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub target: String,
    /// `imports`, `calls` or `all`.
    #[serde(default = "default_dependency_type")]
    pub dependency_type: String,
    /// Follow the same edge kind past the first hop.
    #[serde(default)]
    pub include_transitive: bool,
}

fn default_dependency_type() -> String {
    "all".to_string()
}

impl DependencyAnalysis {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            dependency_type: default_dependency_type(),
            include_transitive: false,
        }
    }

    pub fn with_type(mut self, dependency_type: impl Into<String>) -> Self {
        self.dependency_type = dependency_type.into();
        self
    }

    pub fn transitive(mut self, include_transitive: bool) -> Self {
        self.include_transitive = include_transitive;
        self
    }

    async fn imports(&self, ctx: &DatabaseContext, depth: usize) -> Result<Vec<Row>, QueryError> {
        let walk = Traversal::from(self.target.trim(), &[Relation::Imports], Direction::Outgoing)
            .depth(depth)
            .run(ctx)
            .await?;

        let mut rows = hydrate(ctx, &walk.visits).await?;
        annotate(&mut rows, &walk.visits, "source");
        Ok(rows)
    }

    async fn calls(&self, ctx: &DatabaseContext, depth: usize) -> Result<Vec<Row>, QueryError> {
        let target = self.target.trim().to_string();

        let mut sources: Vec<String> = ctx
            .edges(std::slice::from_ref(&target), &[Relation::Defines], Direction::Outgoing)
            .await?
            .into_iter()
            .map(|edge| edge.dst)
            .collect();
        sources.sort();
        sources.dedup();
        sources.insert(0, target);

        let walk = Traversal::new(sources, vec![Relation::Calls], Direction::Outgoing)
            .depth(depth)
            .run(ctx)
            .await?;

        let mut rows = hydrate(ctx, &walk.visits).await?;
        annotate(&mut rows, &walk.visits, "source");
        Ok(rows)
    }
}

#[async_trait]
impl QueryTool for DependencyAnalysis {
    const KIND: QueryKind = QueryKind::DependencyAnalysis;

    fn validate(&self) -> Result<(), QueryError> {
        require_identifier("target", &self.target)?;
        parse_choice::<DependencyType>("dependency_type", &self.dependency_type)?;
        Ok(())
    }

    fn target(&self) -> Option<Target<'_>> {
        Some(Target::new(&self.target, DEPENDENCY_TARGET))
    }

    async fn execute(&self, ctx: &DatabaseContext, config: &QueryConfig) -> Result<Outcome, QueryError> {
        let dependency_type = parse_choice::<DependencyType>("dependency_type", &self.dependency_type)?;
        let depth = if self.include_transitive {
            config.transitive_depth
        } else {
            1
        };

        let mut sections = Vec::new();
        if dependency_type.includes_imports() {
            sections.push(("imports", self.imports(ctx, depth).await?));
        }
        if dependency_type.includes_calls() {
            sections.push(("calls", self.calls(ctx, depth).await?));
        }

        let description = format!(
            "{} dependencies of {}{}",
            match dependency_type {
                DependencyType::Imports => "Import",
                DependencyType::Calls => "Call",
                DependencyType::All => "Import and call",
            },
            self.target.trim(),
            if self.include_transitive { " (transitive)" } else { "" }
        );
        Ok(Outcome::from_sections(description, sections))
    }
}
