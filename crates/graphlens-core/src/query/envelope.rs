//! Success and error envelopes returned by every operation.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ErrorKind, QueryError};
use super::QueryKind;
use crate::graph::Row;

/// Successful result of a query operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Human-readable description of what was asked.
    pub query: String,
    /// Ordered result rows.
    pub results: Vec<Row>,
    /// Named subsets for operations that return more than one sequence
    /// (hierarchy ancestors/descendants, dependency imports/calls).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, Vec<Row>>,
    pub metadata: Metadata,
}

impl QueryResult {
    /// Rows of a named section, empty if absent.
    pub fn section(&self, name: &str) -> &[Row] {
        self.sections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Result metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Rows returned.
    pub row_count: usize,
    /// Rows that matched before any cap was applied.
    pub total_count: usize,
    /// Whether a cap dropped rows.
    pub truncated: bool,
    /// Wall-clock time spent in the operation, in milliseconds.
    pub execution_time_ms: f64,
    pub query_kind: QueryKind,
}

/// Structured failure of a query operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    pub error_kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// The caller's arguments, echoed back.
    pub provided_input: Value,
}

/// What every operation returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Success(QueryResult),
    Error(ErrorEnvelope),
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success(_))
    }

    pub fn success(&self) -> Option<&QueryResult> {
        match self {
            Envelope::Success(result) => Some(result),
            Envelope::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ErrorEnvelope> {
        match self {
            Envelope::Success(_) => None,
            Envelope::Error(error) => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(|e| e.error_kind)
    }

    /// Copy with execution time zeroed, for comparing repeated runs.
    pub fn without_timing(&self) -> Envelope {
        let mut copy = self.clone();
        if let Envelope::Success(result) = &mut copy {
            result.metadata.execution_time_ms = 0.0;
        }
        copy
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// What an operation produced before formatting.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub description: String,
    pub results: Vec<Row>,
    pub sections: BTreeMap<String, Vec<Row>>,
    /// Pre-cap match count; defaults to the row count.
    pub total_count: Option<usize>,
    pub truncated: bool,
}

impl Outcome {
    pub fn new(description: impl Into<String>, results: Vec<Row>) -> Self {
        Self {
            description: description.into(),
            results,
            ..Self::default()
        }
    }

    /// Build `results` as the concatenation of named sections, in the given order.
    pub fn from_sections(description: impl Into<String>, sections: Vec<(&str, Vec<Row>)>) -> Self {
        let mut outcome = Self::new(description, Vec::new());
        for (name, rows) in sections {
            outcome.results.extend(rows.iter().cloned());
            outcome.sections.insert(name.to_string(), rows);
        }
        outcome
    }

    pub fn with_total(mut self, total_count: usize, truncated: bool) -> Self {
        self.total_count = Some(total_count);
        self.truncated = truncated;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Format a success envelope.
pub fn success(kind: QueryKind, outcome: Outcome, elapsed: Duration) -> Envelope {
    let row_count = outcome.results.len();
    Envelope::Success(QueryResult {
        query: outcome.description,
        results: outcome.results,
        sections: outcome.sections,
        metadata: Metadata {
            row_count,
            total_count: outcome.total_count.unwrap_or(row_count).max(row_count),
            truncated: outcome.truncated,
            execution_time_ms: elapsed.as_secs_f64() * 1000.0,
            query_kind: kind,
        },
    })
}

/// Format an error envelope.
pub fn failure(error: QueryError, provided_input: Value) -> Envelope {
    Envelope::Error(error.into_envelope(provided_input))
}
