//! The seven query operations.
//!
//! Each type here is the parameter set of one operation and implements
//! [`QueryTool`](super::QueryTool); the shared pipeline lives in
//! [`run_tool`](super::run_tool).

mod adhoc;
mod call_graph;
mod callers;
mod dependencies;
mod exports;
mod hierarchy;
mod implementations;

pub use adhoc::AdHocQuery;
pub use call_graph::CallGraph;
pub use callers::FindCallers;
pub use dependencies::DependencyAnalysis;
pub use exports::ModuleExports;
pub use hierarchy::ClassHierarchy;
pub use implementations::InterfaceImplementations;

use serde_json::json;

use super::traverse::Visit;
use crate::graph::{EntityKind, Row};

pub(crate) const CALLABLE: &[EntityKind] = &[EntityKind::Function, EntityKind::Method];
pub(crate) const CLASS: &[EntityKind] = &[EntityKind::Class];
pub(crate) const MODULE: &[EntityKind] = &[EntityKind::Module];
pub(crate) const DEPENDENCY_TARGET: &[EntityKind] = &[EntityKind::Module, EntityKind::Function, EntityKind::Method];
pub(crate) const EXPORTABLE: &[EntityKind] = &[EntityKind::Function, EntityKind::Class, EntityKind::Method];

/// Add the relationship followed and the node it was reached from.
pub(crate) fn annotate(rows: &mut [Row], visits: &[Visit], via_column: &str) {
    for (row, visit) in rows.iter_mut().zip(visits) {
        row.insert("relationship".into(), json!(visit.relation.as_str()));
        row.insert(via_column.to_string(), json!(visit.parent));
    }
}

fn default_true() -> bool {
    true
}
