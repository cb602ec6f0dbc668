//! Existence verification for empty traversal results.

use tracing::debug;

use super::error::QueryError;
use crate::context::DatabaseContext;
use crate::graph::EntityKind;

/// The entity an operation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target<'a> {
    pub name: &'a str,
    pub kinds: &'static [EntityKind],
}

impl<'a> Target<'a> {
    pub fn new(name: &'a str, kinds: &'static [EntityKind]) -> Self {
        Self { name, kinds }
    }
}

/// Distinguish "no relationships" from "no such entity".
///
/// Only called when the primary traversal returned zero rows. `Ok(())` means
/// the empty result stands.
pub async fn ensure_exists(ctx: &DatabaseContext, target: Target<'_>) -> Result<(), QueryError> {
    let name = target.name.trim();
    match ctx.lookup(name, target.kinds).await? {
        Some(_) => {
            debug!(target = name, "target exists; empty result is legitimate");
            Ok(())
        }
        None => Err(QueryError::NodeNotFound {
            name: name.to_string(),
            kind: EntityKind::describe(target.kinds),
        }),
    }
}
