use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{annotate, CLASS};
use crate::config::QueryConfig;
use crate::context::DatabaseContext;
use crate::graph::{Direction, Relation};
use crate::query::envelope::Outcome;
use crate::query::traverse::{hydrate, Traversal};
use crate::query::validate::{require_identifier, HIERARCHY_DEPTH};
use crate::query::verify::Target;
use crate::query::{QueryError, QueryKind, QueryTool};

/// Classes implementing or extending an interface or base class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceImplementations {
    pub interface_name: String,
    /// Include implementors of implementors, up to the hierarchy depth limit.
    #[serde(default)]
    pub include_indirect: bool,
}

impl InterfaceImplementations {
    pub fn new(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            include_indirect: false,
        }
    }

    pub fn indirect(mut self, include_indirect: bool) -> Self {
        self.include_indirect = include_indirect;
        self
    }
}

#[async_trait]
impl QueryTool for InterfaceImplementations {
    const KIND: QueryKind = QueryKind::InterfaceImplementations;

    fn validate(&self) -> Result<(), QueryError> {
        require_identifier("interface_name", &self.interface_name)
    }

    fn target(&self) -> Option<Target<'_>> {
        Some(Target::new(&self.interface_name, CLASS))
    }

    async fn execute(&self, ctx: &DatabaseContext, _config: &QueryConfig) -> Result<Outcome, QueryError> {
        let depth = if self.include_indirect {
            *HIERARCHY_DEPTH.end() as usize
        } else {
            1
        };

        let walk = Traversal::from(
            self.interface_name.trim(),
            &[Relation::Implements, Relation::Inherits],
            Direction::Incoming,
        )
        .depth(depth)
        .run(ctx)
        .await?;

        let mut rows = hydrate(ctx, &walk.visits).await?;
        annotate(&mut rows, &walk.visits, "via");

        Ok(Outcome::new(
            format!(
                "{} implementations of {}",
                if self.include_indirect { "Direct and indirect" } else { "Direct" },
                self.interface_name.trim()
            ),
            rows,
        ))
    }
}
