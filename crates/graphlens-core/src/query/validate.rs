//! Parameter validation, run before any database access.
//!
//! Every function here is pure and synchronous.

use std::ops::RangeInclusive;

use super::error::QueryError;

/// Caller search depth.
pub const CALLER_DEPTH: RangeInclusive<i64> = 1..=5;
/// Class hierarchy depth.
pub const HIERARCHY_DEPTH: RangeInclusive<i64> = 1..=10;
/// Call graph depth.
pub const CALL_GRAPH_DEPTH: RangeInclusive<i64> = 1..=5;
/// Call graph node cap.
pub const CALL_GRAPH_NODES: RangeInclusive<i64> = 1..=100;
/// Expert-mode result limit.
pub const AD_HOC_LIMIT: RangeInclusive<i64> = 1..=1000;

/// Reject empty and whitespace-only identifiers.
pub fn require_identifier(field: &str, value: &str) -> Result<(), QueryError> {
    if value.trim().is_empty() {
        return Err(QueryError::invalid(format!(
            "{} must be a non-empty string",
            field
        )));
    }
    Ok(())
}

/// Reject integers outside an inclusive range.
pub fn require_range(field: &str, value: i64, range: &RangeInclusive<i64>) -> Result<(), QueryError> {
    if !range.contains(&value) {
        return Err(QueryError::invalid(format!(
            "{} must be between {} and {} (inclusive), got {}",
            field,
            range.start(),
            range.end(),
            value
        )));
    }
    Ok(())
}

/// A closed set of accepted string values.
pub trait Choice: Sized + Copy + 'static {
    const VARIANTS: &'static [Self];

    fn as_str(&self) -> &'static str;
}

/// Parse a [`Choice`], listing every accepted value on failure.
///
/// Matching is exact: `"UP"` and `" up"` are rejected.
pub fn parse_choice<T: Choice>(field: &str, value: &str) -> Result<T, QueryError> {
    T::VARIANTS
        .iter()
        .copied()
        .find(|variant| variant.as_str() == value)
        .ok_or_else(|| {
            let accepted: Vec<&str> = T::VARIANTS.iter().map(|v| v.as_str()).collect();
            QueryError::invalid(format!(
                "Invalid {} '{}'. Must be one of: {}",
                field,
                value,
                accepted.join(", ")
            ))
        })
}

/// Which way a class hierarchy is walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyDirection {
    /// Ancestors only.
    Up,
    /// Descendants only.
    Down,
    /// Ancestors and descendants, as separate sequences.
    Both,
}

impl Choice for HierarchyDirection {
    const VARIANTS: &'static [Self] = &[
        HierarchyDirection::Up,
        HierarchyDirection::Down,
        HierarchyDirection::Both,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            HierarchyDirection::Up => "up",
            HierarchyDirection::Down => "down",
            HierarchyDirection::Both => "both",
        }
    }
}

/// Which edges dependency analysis collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyType {
    Imports,
    Calls,
    /// Imports and calls, reported as two subsets.
    All,
}

impl Choice for DependencyType {
    const VARIANTS: &'static [Self] = &[DependencyType::Imports, DependencyType::Calls, DependencyType::All];

    fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Imports => "imports",
            DependencyType::Calls => "calls",
            DependencyType::All => "all",
        }
    }
}

impl DependencyType {
    pub fn includes_imports(&self) -> bool {
        matches!(self, DependencyType::Imports | DependencyType::All)
    }

    pub fn includes_calls(&self) -> bool {
        matches!(self, DependencyType::Calls | DependencyType::All)
    }
}
