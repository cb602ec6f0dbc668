//! Expert-mode security guard.
//!
//! Pure keyword scan over the query text. No parsing: a forbidden word inside
//! a string literal is rejected too.

use std::sync::OnceLock;

use regex::Regex;

use super::error::QueryError;

/// Forbidden operations, multi-word forms first so they are reported by
/// their full name.
const FORBIDDEN: &[(&str, &str)] = &[
    ("CREATE INDEX", r"\bcreate\s+index\b"),
    ("CREATE CONSTRAINT", r"\bcreate\s+constraint\b"),
    ("DETACH DELETE", r"\bdetach\s+delete\b"),
    ("CREATE", r"\bcreate\b"),
    ("DELETE", r"\bdelete\b"),
    ("SET", r"\bset\b"),
    ("MERGE", r"\bmerge\b"),
    ("DROP", r"\bdrop\b"),
    ("REMOVE", r"\bremove\b"),
    // SurrealQL writes
    ("UPDATE", r"\bupdate\b"),
    ("UPSERT", r"\bupsert\b"),
    ("INSERT", r"\binsert\b"),
    ("RELATE", r"\brelate\b"),
    ("DEFINE", r"\bdefine\b"),
];

fn patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        FORBIDDEN
            .iter()
            .filter_map(|(keyword, pattern)| {
                Regex::new(&format!("(?i){}", pattern))
                    .ok()
                    .map(|re| (*keyword, re))
            })
            .collect()
    })
}

/// First forbidden keyword found in `query`, if any.
pub fn forbidden_keyword(query: &str) -> Option<&'static str> {
    patterns()
        .iter()
        .find(|(_, re)| re.is_match(query))
        .map(|(keyword, _)| *keyword)
}

/// Reject any query text containing a write or schema operation.
pub fn check_read_only(query: &str) -> Result<(), QueryError> {
    match forbidden_keyword(query) {
        Some(keyword) => Err(QueryError::ForbiddenOperation {
            keyword: keyword.to_string(),
        }),
        None => Ok(()),
    }
}
