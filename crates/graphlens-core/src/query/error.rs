//! Query error taxonomy.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::envelope::ErrorEnvelope;

/// Closed set of error kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Parameter validation failed. Never retried.
    InvalidParameter,
    /// Expert-mode query attempted a write. Never retried.
    ForbiddenOperation,
    /// The target entity does not exist.
    NodeNotFound,
    /// The database exceeded its time budget. Safe to retry once.
    QueryTimeout,
    /// Connectivity or tenant activation failed.
    ConnectionError,
    /// Anything else.
    UnknownError,
}

impl ErrorKind {
    /// Whether the operation may be retried automatically.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::QueryTimeout)
    }
}

/// Errors produced by a query operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("{message}")]
    InvalidParameter { message: String },

    #[error("Forbidden operation '{keyword}' detected. Expert mode is read-only.")]
    ForbiddenOperation { keyword: String },

    #[error("{kind} '{name}' not found")]
    NodeNotFound { name: String, kind: String },

    #[error("Query exceeded the {timeout_ms} ms time budget")]
    Timeout { timeout_ms: u64 },

    #[error("Failed to activate database '{tenant}': {message}")]
    Connection { tenant: String, message: String },

    #[error("{0}")]
    Unknown(String),
}

impl QueryError {
    pub fn invalid(message: impl Into<String>) -> Self {
        QueryError::InvalidParameter {
            message: message.into(),
        }
    }

    pub fn connection(tenant: impl Into<String>, message: impl Into<String>) -> Self {
        QueryError::Connection {
            tenant: tenant.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            QueryError::ForbiddenOperation { .. } => ErrorKind::ForbiddenOperation,
            QueryError::NodeNotFound { .. } => ErrorKind::NodeNotFound,
            QueryError::Timeout { .. } => ErrorKind::QueryTimeout,
            QueryError::Connection { .. } => ErrorKind::ConnectionError,
            QueryError::Unknown(_) => ErrorKind::UnknownError,
        }
    }

    /// Remediation hint for the caller.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            QueryError::InvalidParameter { .. } => {
                Some("Check the parameter values against the tool's input schema.".to_string())
            }
            QueryError::ForbiddenOperation { .. } => Some(
                "Only read-only queries are allowed: use MATCH, RETURN, WHERE, ORDER BY and LIMIT."
                    .to_string(),
            ),
            QueryError::NodeNotFound { .. } => Some(
                "Check the spelling of the qualified name ({project}.{path}.{entity}) and confirm the codebase has been indexed."
                    .to_string(),
            ),
            QueryError::Timeout { .. } => {
                Some("Reduce the traversal depth or result limit and try again.".to_string())
            }
            QueryError::Connection { .. } => Some(
                "Verify the database endpoint is reachable and the tenant database exists.".to_string(),
            ),
            QueryError::Unknown(_) => None,
        }
    }

    /// Build the error envelope, echoing the caller's arguments.
    pub fn into_envelope(self, provided_input: Value) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.to_string(),
            error_kind: self.kind(),
            suggestion: self.suggestion(),
            provided_input,
        }
    }
}
