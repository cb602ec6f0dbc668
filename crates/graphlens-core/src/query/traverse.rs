//! Breadth-first traversal over [`GraphStore::edges`](crate::graph::GraphStore::edges).
//!
//! One store round-trip per level. Within a level, newly discovered nodes are
//! ordered by qualified name so repeated walks produce identical output.

use std::collections::{HashMap, HashSet};

use serde_json::json;

use super::error::QueryError;
use crate::context::DatabaseContext;
use crate::graph::{dangling_row, Direction, Relation, Row};

/// A traversal plan. Building one performs no I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub start: Vec<String>,
    pub relations: Vec<Relation>,
    pub direction: Direction,
    pub max_depth: usize,
    /// Stop once more than this many nodes have been discovered.
    pub max_nodes: Option<usize>,
}

/// A node reached by a traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct Visit {
    pub name: String,
    pub depth: usize,
    /// Node this one was first reached from.
    pub parent: String,
    /// Relationship followed to get here.
    pub relation: Relation,
}

/// Result of running a [`Traversal`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Walk {
    /// Discovered nodes in (depth, name) order, capped at `max_nodes`.
    pub visits: Vec<Visit>,
    /// Nodes discovered before the cap was applied.
    pub total: usize,
    /// Whether the node cap dropped anything.
    pub truncated: bool,
}

impl Traversal {
    pub fn new(start: Vec<String>, relations: Vec<Relation>, direction: Direction) -> Self {
        Self {
            start,
            relations,
            direction,
            max_depth: 1,
            max_nodes: None,
        }
    }

    /// Single-node start.
    pub fn from(name: &str, relations: &[Relation], direction: Direction) -> Self {
        Self::new(vec![name.to_string()], relations.to_vec(), direction)
    }

    pub fn depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn node_cap(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    /// Execute the plan level by level.
    pub async fn run(&self, ctx: &DatabaseContext) -> Result<Walk, QueryError> {
        let mut visited: HashSet<String> = self.start.iter().cloned().collect();
        let mut frontier: Vec<String> = self.start.clone();
        let mut walk = Walk::default();

        for depth in 1..=self.max_depth {
            if frontier.is_empty() {
                break;
            }

            let mut edges = ctx.edges(&frontier, &self.relations, self.direction).await?;
            edges.sort();

            let mut level: Vec<Visit> = Vec::new();
            for edge in &edges {
                let (from, to) = edge.oriented(self.direction);
                if visited.insert(to.to_string()) {
                    level.push(Visit {
                        name: to.to_string(),
                        depth,
                        parent: from.to_string(),
                        relation: edge.kind,
                    });
                }
            }
            level.sort_by(|a, b| a.name.cmp(&b.name));

            frontier = level.iter().map(|v| v.name.clone()).collect();
            walk.visits.extend(level);

            if let Some(cap) = self.max_nodes {
                if walk.visits.len() > cap {
                    walk.total = walk.visits.len();
                    walk.visits.truncate(cap);
                    walk.truncated = true;
                    return Ok(walk);
                }
            }
        }

        walk.total = walk.visits.len();
        Ok(walk)
    }
}

impl Walk {
    /// Chain from `name` back to the start node that reached it.
    pub fn path_to_start(&self, name: &str) -> Vec<String> {
        let parents: HashMap<&str, &str> = self
            .visits
            .iter()
            .map(|v| (v.name.as_str(), v.parent.as_str()))
            .collect();

        let mut path = vec![name.to_string()];
        let mut current = name;
        while let Some(&parent) = parents.get(current) {
            path.push(parent.to_string());
            current = parent;
            if path.len() > self.visits.len() + 1 {
                break;
            }
        }
        path
    }
}

/// Rows for the visited nodes, hydrated with entity attributes in one round-trip.
///
/// Each row carries `depth`; names the graph has no entity for become
/// minimal rows rather than being dropped.
pub async fn hydrate(ctx: &DatabaseContext, visits: &[Visit]) -> Result<Vec<Row>, QueryError> {
    if visits.is_empty() {
        return Ok(Vec::new());
    }
    let names: Vec<String> = visits.iter().map(|v| v.name.clone()).collect();
    let entities: HashMap<String, Row> = ctx
        .entities(&names)
        .await?
        .into_iter()
        .map(|e| (e.qualified_name.clone(), e.to_row()))
        .collect();

    Ok(visits
        .iter()
        .map(|visit| {
            let mut row = entities
                .get(&visit.name)
                .cloned()
                .unwrap_or_else(|| dangling_row(&visit.name));
            row.insert("depth".into(), json!(visit.depth));
            row
        })
        .collect())
}
