use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{annotate, CLASS};
use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use crate::graph::{Direction, Relation, Row};
use crate::query::envelope::Outcome;
use crate::query::traverse::{hydrate, Traversal};
use crate::query::validate::{parse_choice, require_identifier, require_range, HierarchyDirection, HIERARCHY_DEPTH};
use crate::query::verify::Target;
use crate::query::{QueryError, QueryKind, QueryTool};

const RELATIONS: &[Relation] = &[Relation::Inherits, Relation::Implements];

/// Ancestors and/or descendants of a class over INHERITS and IMPLEMENTS.
///
/// Edges point from subclass to base, so ancestors are reached by following
/// them outward and descendants by following them inward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassHierarchy {
    pub class_name: String,
    /// `up`, `down` or `both`.
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default = "default_max_depth")]
    pub max_depth: i64,
}

fn default_direction() -> String {
    "both".to_string()
}

fn default_max_depth() -> i64 {
    10
}

impl ClassHierarchy {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            direction: default_direction(),
            max_depth: default_max_depth(),
        }
    }

    pub fn with_direction(mut self, direction: impl Into<String>) -> Self {
        self.direction = direction.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: i64) -> Self {
        self.max_depth = max_depth;
        self
    }

    async fn walk(&self, ctx: &DatabaseContext, direction: Direction) -> Result<Vec<Row>, QueryError> {
        let walk = Traversal::from(self.class_name.trim(), RELATIONS, direction)
            .depth(self.max_depth as usize)
            .run(ctx)
            .await?;

        let mut rows = hydrate(ctx, &walk.visits).await?;
        let via = match direction {
            Direction::Outgoing => "subclass",
            Direction::Incoming => "base",
        };
        annotate(&mut rows, &walk.visits, via);
        Ok(rows)
    }
}

#[async_trait]
impl QueryTool for ClassHierarchy {
    const KIND: QueryKind = QueryKind::ClassHierarchy;

    fn validate(&self) -> Result<(), QueryError> {
        require_identifier("class_name", &self.class_name)?;
        parse_choice::<HierarchyDirection>("direction", &self.direction)?;
        require_range("max_depth", self.max_depth, &HIERARCHY_DEPTH)
    }

    fn target(&self) -> Option<Target<'_>> {
        Some(Target::new(&self.class_name, CLASS))
    }

    async fn execute(&self, ctx: &DatabaseContext, _config: &QueryConfig) -> Result<Outcome, QueryError> {
        let direction = parse_choice::<HierarchyDirection>("direction", &self.direction)?;
        let description = format!(
            "Class hierarchy of {} ({}, depth {})",
            self.class_name.trim(),
            direction_label(direction),
            self.max_depth
        );

        let outcome = match direction {
            HierarchyDirection::Up => {
                Outcome::new(description, self.walk(ctx, Direction::Outgoing).await?)
            }
            HierarchyDirection::Down => {
                Outcome::new(description, self.walk(ctx, Direction::Incoming).await?)
            }
            HierarchyDirection::Both => {
                let ancestors = self.walk(ctx, Direction::Outgoing).await?;
                let descendants = self.walk(ctx, Direction::Incoming).await?;
                Outcome::from_sections(
                    description,
                    vec![("ancestors", ancestors), ("descendants", descendants)],
                )
            }
        };
        Ok(outcome)
    }
}

fn direction_label(direction: HierarchyDirection) -> &'static str {
    match direction {
        HierarchyDirection::Up => "ancestors",
        HierarchyDirection::Down => "descendants",
        HierarchyDirection::Both => "ancestors and descendants",
    }
}
