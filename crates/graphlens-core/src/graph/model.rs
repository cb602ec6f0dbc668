//! Entities and relationships as read from the code graph.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// One result row: a JSON object keyed by column name.
pub type Row = serde_json::Map<String, Value>;

// =============================================================================
// ENTITY KINDS
// =============================================================================

/// Kinds of entities materialized by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    /// Tenant root; owns every other entity through CONTAINS.
    Project,
    Module,
    Class,
    Function,
    Method,
    /// Third-party package reached through IMPORTS.
    ExternalPackage,
}

impl EntityKind {
    /// Label as stored in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "Project",
            EntityKind::Module => "Module",
            EntityKind::Class => "Class",
            EntityKind::Function => "Function",
            EntityKind::Method => "Method",
            EntityKind::ExternalPackage => "ExternalPackage",
        }
    }

    /// Human-readable description of a kind set, e.g. `Function or Method`.
    pub fn describe(kinds: &[EntityKind]) -> String {
        let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
        match names.split_last() {
            None => "Entity".to_string(),
            Some((last, [])) => last.to_string(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// RELATIONSHIPS
// =============================================================================

/// Directed relationship kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    /// Project -> any entity. The tenant isolation boundary.
    Contains,
    /// Module -> Function | Class | Method.
    Defines,
    /// Module -> Module | ExternalPackage.
    Imports,
    /// Function | Method -> Function | Method.
    Calls,
    /// Subclass -> base class.
    Inherits,
    /// Class -> interface it implements.
    Implements,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Contains => "CONTAINS",
            Relation::Defines => "DEFINES",
            Relation::Imports => "IMPORTS",
            Relation::Calls => "CALLS",
            Relation::Inherits => "INHERITS",
            Relation::Implements => "IMPLEMENTS",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which end of an edge a hop starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Follow `src -> dst`.
    Outgoing,
    /// Follow `dst -> src`.
    Incoming,
}

// =============================================================================
// ENTITY
// =============================================================================

/// A code entity node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique `{project}.{path}.{entity}` identifier.
    pub qualified_name: String,
    /// Display name.
    pub name: String,
    /// Type tags; the first one is the representative kind.
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub line_start: Option<u32>,
    #[serde(default)]
    pub line_end: Option<u32>,
    /// Type-specific attributes such as `base_classes` or `decorators`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Row,
}

/// Selected fields a record lacks come back as `NONE`, not as missing keys.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Entity {
    /// Create an entity whose display name is the last dotted segment.
    pub fn new(kind: EntityKind, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let name = display_name(&qualified_name).to_string();
        Self {
            qualified_name,
            name,
            labels: vec![kind.as_str().to_string()],
            file_path: None,
            line_start: None,
            line_end: None,
            properties: Row::new(),
        }
    }

    pub fn with_location(mut self, file_path: impl Into<String>, line_start: u32, line_end: u32) -> Self {
        self.file_path = Some(file_path.into());
        self.line_start = Some(line_start);
        self.line_end = Some(line_end);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Representative type tag, used for display and ordering.
    pub fn primary_label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("")
    }

    /// Whether any label matches one of `kinds`.
    pub fn is_any(&self, kinds: &[EntityKind]) -> bool {
        self.labels
            .iter()
            .any(|label| kinds.iter().any(|kind| kind.as_str() == label))
    }

    /// Standard result columns for this entity.
    pub fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("qualified_name".into(), json!(self.qualified_name));
        row.insert("name".into(), json!(self.name));
        row.insert("type".into(), json!(self.primary_label()));
        row.insert("labels".into(), json!(self.labels));
        row.insert("file_path".into(), json!(self.file_path));
        row.insert("line_start".into(), json!(self.line_start));
        row.insert("line_end".into(), json!(self.line_end));
        for (key, value) in &self.properties {
            row.entry(key.clone()).or_insert_with(|| value.clone());
        }
        row
    }
}

/// Row for a name the graph references but has no entity record for.
pub fn dangling_row(qualified_name: &str) -> Row {
    let mut row = Row::new();
    row.insert("qualified_name".into(), json!(qualified_name));
    row.insert("name".into(), json!(display_name(qualified_name)));
    row.insert("type".into(), Value::Null);
    row
}

/// Last dotted segment of a qualified name.
pub fn display_name(qualified_name: &str) -> &str {
    qualified_name.rsplit('.').next().unwrap_or(qualified_name)
}

// =============================================================================
// EDGE
// =============================================================================

/// A directed relationship between two entities, keyed by qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub src: String,
    pub dst: String,
    pub kind: Relation,
}

impl Edge {
    pub fn new(src: impl Into<String>, kind: Relation, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            kind,
        }
    }

    /// `(from, to)` when walking this edge in `direction`.
    pub fn oriented(&self, direction: Direction) -> (&str, &str) {
        match direction {
            Direction::Outgoing => (&self.src, &self.dst),
            Direction::Incoming => (&self.dst, &self.src),
        }
    }
}
