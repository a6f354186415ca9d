//! The recursive filter-tree node
//!
//! # Example
//!
//! ```rust
//! use bedrock_persistence::dynamics::Filter;
//!
//! // age >= 18 and (status = "active")
//! let filter = Filter::gte("age", "18").and(vec![Filter::eq("status", "active")]);
//! assert_eq!(filter.filters.len(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// A single node of a filter tree
///
/// The operator is kept as the caller-supplied string; it is validated
/// against the fixed operator set at compile time
/// ([`compile`](super::compile)), not at construction, so a `Filter` can be
/// decoded from any request body and rejected eagerly before a store
/// round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    /// Name of the attribute being compared
    pub field: String,

    /// One of: `eq`, `neq`, `lt`, `lte`, `gt`, `gte`, `isnull`, `isnotnull`,
    /// `startswith`, `endswith`, `contains`, `doesnotcontain`
    pub operator: String,

    /// Comparison value; required for all operators except the null checks
    #[serde(default)]
    pub value: Option<String>,

    /// Combinator joining this node with its children: `and` or `or`
    #[serde(default)]
    pub logic: Option<String>,

    /// Sub-clauses combined via `logic`, in order
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl Filter {
    /// Create a leaf node with an operator and value
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: Some(value.into()),
            logic: None,
            filters: Vec::new(),
        }
    }

    /// Create a unary leaf node (no value), for the null-check operators
    pub fn unary(field: impl Into<String>, operator: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: None,
            logic: None,
            filters: Vec::new(),
        }
    }

    /// Equality filter (`field = value`)
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "eq", value)
    }

    /// Not-equal filter (`field != value`)
    pub fn neq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "neq", value)
    }

    /// Less-than filter
    pub fn lt(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "lt", value)
    }

    /// Less-or-equal filter
    pub fn lte(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "lte", value)
    }

    /// Greater-than filter
    pub fn gt(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "gt", value)
    }

    /// Greater-or-equal filter
    pub fn gte(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "gte", value)
    }

    /// Null-check filter (`field IS NULL`)
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::unary(field, "isnull")
    }

    /// Not-null-check filter (`field IS NOT NULL`)
    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::unary(field, "isnotnull")
    }

    /// Prefix-match filter
    pub fn starts_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "startswith", value)
    }

    /// Suffix-match filter
    pub fn ends_with(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "endswith", value)
    }

    /// Substring-match filter
    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "contains", value)
    }

    /// Negated substring-match filter
    pub fn does_not_contain(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, "doesnotcontain", value)
    }

    /// Combine this node with sub-clauses using `and`
    #[must_use]
    pub fn and(mut self, filters: Vec<Filter>) -> Self {
        self.logic = Some("and".to_string());
        self.filters = filters;
        self
    }

    /// Combine this node with sub-clauses using `or`
    #[must_use]
    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.logic = Some("or".to_string());
        self.filters = filters;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_constructors() {
        let filter = Filter::gte("age", "18");
        assert_eq!(filter.field, "age");
        assert_eq!(filter.operator, "gte");
        assert_eq!(filter.value.as_deref(), Some("18"));
        assert!(filter.logic.is_none());
        assert!(filter.filters.is_empty());
    }

    #[test]
    fn test_unary_has_no_value() {
        let filter = Filter::is_null("deleted_at");
        assert_eq!(filter.operator, "isnull");
        assert!(filter.value.is_none());
    }

    #[test]
    fn test_and_attaches_children() {
        let filter = Filter::gte("age", "18").and(vec![Filter::eq("status", "active")]);
        assert_eq!(filter.logic.as_deref(), Some("and"));
        assert_eq!(filter.filters[0].field, "status");
    }

    #[test]
    fn test_serde_defaults() {
        let filter: Filter =
            serde_json::from_str(r#"{ "field": "name", "operator": "contains", "value": "x" }"#)
                .unwrap();
        assert!(filter.logic.is_none());
        assert!(filter.filters.is_empty());
    }
}
