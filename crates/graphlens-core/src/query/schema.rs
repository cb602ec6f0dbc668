//! JSON-schema descriptions of the query tools.

use serde::Serialize;
use serde_json::{json, Value};

use super::validate::{AD_HOC_LIMIT, CALLER_DEPTH, CALL_GRAPH_DEPTH, CALL_GRAPH_NODES, HIERARCHY_DEPTH};
use super::QueryKind;

/// A named, schema-described tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

const QUALIFIED_NAME: &str = "Fully qualified name: {project}.{path}.{entity}";

/// Specs for all seven tools, in [`QueryKind::ALL`] order.
pub fn tool_specs() -> Vec<ToolSpec> {
    QueryKind::ALL.iter().map(|kind| tool_spec(*kind)).collect()
}

pub fn tool_spec(kind: QueryKind) -> ToolSpec {
    let (description, input_schema) = match kind {
        QueryKind::FindCallers => (
            "Find functions and methods that call the given function, optionally transitively.",
            json!({
                "type": "object",
                "properties": {
                    "function_name": { "type": "string", "description": QUALIFIED_NAME },
                    "max_depth": {
                        "type": "integer",
                        "minimum": CALLER_DEPTH.start(),
                        "maximum": CALLER_DEPTH.end(),
                        "default": 1,
                        "description": "1 returns direct callers only."
                    },
                    "include_paths": {
                        "type": "boolean",
                        "default": true,
                        "description": "Attach the call chain from each caller to the target."
                    }
                },
                "required": ["function_name"]
            }),
        ),
        QueryKind::ClassHierarchy => (
            "Walk a class's inheritance and implementation hierarchy.",
            json!({
                "type": "object",
                "properties": {
                    "class_name": { "type": "string", "description": QUALIFIED_NAME },
                    "direction": {
                        "type": "string",
                        "enum": ["up", "down", "both"],
                        "default": "both",
                        "description": "up: ancestors, down: descendants, both: two separate sequences."
                    },
                    "max_depth": {
                        "type": "integer",
                        "minimum": HIERARCHY_DEPTH.start(),
                        "maximum": HIERARCHY_DEPTH.end(),
                        "default": 10
                    }
                },
                "required": ["class_name"]
            }),
        ),
        QueryKind::DependencyAnalysis => (
            "List what a module or function imports and calls.",
            json!({
                "type": "object",
                "properties": {
                    "target": { "type": "string", "description": QUALIFIED_NAME },
                    "dependency_type": {
                        "type": "string",
                        "enum": ["imports", "calls", "all"],
                        "default": "all"
                    },
                    "include_transitive": {
                        "type": "boolean",
                        "default": false,
                        "description": "Follow dependencies of dependencies."
                    }
                },
                "required": ["target"]
            }),
        ),
        QueryKind::InterfaceImplementations => (
            "Find classes that implement or extend an interface or base class.",
            json!({
                "type": "object",
                "properties": {
                    "interface_name": { "type": "string", "description": QUALIFIED_NAME },
                    "include_indirect": {
                        "type": "boolean",
                        "default": false,
                        "description": "Include implementors reached through intermediate classes."
                    }
                },
                "required": ["interface_name"]
            }),
        ),
        QueryKind::CallGraph => (
            "Build the outgoing call graph from an entry point, bounded by depth and node count.",
            json!({
                "type": "object",
                "properties": {
                    "entry_point": { "type": "string", "description": QUALIFIED_NAME },
                    "max_depth": {
                        "type": "integer",
                        "minimum": CALL_GRAPH_DEPTH.start(),
                        "maximum": CALL_GRAPH_DEPTH.end(),
                        "default": 3
                    },
                    "max_nodes": {
                        "type": "integer",
                        "minimum": CALL_GRAPH_NODES.start(),
                        "maximum": CALL_GRAPH_NODES.end(),
                        "default": 50
                    }
                },
                "required": ["entry_point"]
            }),
        ),
        QueryKind::ModuleExports => (
            "List the functions, classes and methods a module defines.",
            json!({
                "type": "object",
                "properties": {
                    "module_name": { "type": "string", "description": QUALIFIED_NAME },
                    "include_private": {
                        "type": "boolean",
                        "default": false,
                        "description": "Include members whose name starts with an underscore."
                    }
                },
                "required": ["module_name"]
            }),
        ),
        QueryKind::AdHocQuery => (
            "Expert mode: run a read-only graph query. Write and schema operations are rejected.",
            json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Read-only query text." },
                    "parameters": {
                        "type": "object",
                        "default": {},
                        "description": "Values bound to $name placeholders."
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": AD_HOC_LIMIT.start(),
                        "maximum": AD_HOC_LIMIT.end(),
                        "default": 50
                    }
                },
                "required": ["query"]
            }),
        ),
    };

    ToolSpec {
        name: kind.tool_name(),
        description,
        input_schema,
    }
}
