//! Error types for the persistence core
//!
//! Validation failures (`InvalidPageRange`, `UnsupportedOperator`,
//! `OneToOneSoftDeleteConflict`) are detected eagerly, before any store
//! round-trip. Store-native failures are carried through unmodified inside
//! [`StoreError`].
//!
//! # Example
//!
//! ```rust
//! use bedrock_persistence::error::{PersistenceError, StoreError, StoreOperation};
//!
//! let error = PersistenceError::invalid_page_range(3, 1);
//! assert!(matches!(error, PersistenceError::InvalidPageRange { from: 3, index: 1 }));
//!
//! let store = StoreError::connection_failed("connection refused");
//! assert!(store.is_retriable());
//! ```

use std::fmt;

use thiserror::Error;

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Store operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// Counting rows matching a query
    Count,
    /// Fetching rows matching a query
    Fetch,
    /// Persisting new or mutated entities
    Save,
    /// Physically removing an entity
    Remove,
    /// Resolving related rows during a cascade
    ResolveRelation,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::Fetch => write!(f, "fetch"),
            Self::Save => write!(f, "save"),
            Self::Remove => write!(f, "remove"),
            Self::ResolveRelation => write!(f, "resolve_relation"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreErrorKind {
    /// Failed to establish or reuse the store handle
    ConnectionFailed,
    /// Row was not found where one was required
    NotFound,
    /// Constraint violation (unique, foreign key, check)
    ConstraintViolation,
    /// The store rejected the query (unknown field, malformed restriction)
    QueryRejected,
    /// Operation timed out
    Timeout,
    /// Other/unknown store failure
    Other,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::NotFound => write!(f, "not_found"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::QueryRejected => write!(f, "query_rejected"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured store error with operation context
///
/// Produced by [`EntityStore`](crate::repository::EntityStore) implementations
/// and passed through this crate unmodified. The `context` field typically
/// carries the entity type or a query fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    /// The operation being performed when the error occurred
    pub operation: StoreOperation,
    /// The category of error
    pub kind: StoreErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Additional context (e.g., entity type, restriction fragment)
    pub context: Option<String>,
}

impl StoreError {
    /// Create a new store error
    pub fn new(
        operation: StoreOperation,
        kind: StoreErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Create a connection failure error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            StoreOperation::Fetch,
            StoreErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a constraint violation error
    pub fn constraint_violation(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::ConstraintViolation, message)
    }

    /// Create a query-rejected error
    pub fn query_rejected(message: impl Into<String>) -> Self {
        Self::new(StoreOperation::Fetch, StoreErrorKind::QueryRejected, message)
    }

    /// Create a timeout error
    pub fn timeout(operation: StoreOperation, message: impl Into<String>) -> Self {
        Self::new(operation, StoreErrorKind::Timeout, message)
    }

    /// Add context to an existing error
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: StoreOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is transient and may succeed on retry
    ///
    /// This crate never retries; the classification is for callers.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            StoreErrorKind::ConnectionFailed | StoreErrorKind::Timeout
        )
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Store {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(ref context) = self.context {
            write!(f, " [{}]", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {}

/// Top-level error for the persistence core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    /// Pagination was requested with a baseline offset past the page index
    #[error("invalid page range: from {from} cannot be greater than index {index}")]
    InvalidPageRange {
        /// Baseline page offset
        from: u32,
        /// Requested page number
        index: u32,
    },

    /// A dynamic filter used an operator outside the fixed set
    #[error("unsupported filter operator: {operator:?}")]
    UnsupportedOperator {
        /// The operator string as supplied by the caller
        operator: String,
    },

    /// Soft delete refused: the entity is the dependent side of a one-to-one
    /// relationship, and re-inserting a row with the same foreign key would
    /// collide with the logically deleted dependent row
    #[error(
        "entity {entity_type} has a one-to-one relationship; soft delete would \
         conflict with a later insert using the same foreign key"
    )]
    OneToOneSoftDeleteConflict {
        /// Type name of the entity that failed the guard
        entity_type: String,
    },

    /// Store-native failure, passed through unmodified
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration could not be loaded or validated
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl PersistenceError {
    /// Create an [`PersistenceError::InvalidPageRange`] error
    pub fn invalid_page_range(from: u32, index: u32) -> Self {
        Self::InvalidPageRange { from, index }
    }

    /// Create an [`PersistenceError::UnsupportedOperator`] error
    pub fn unsupported_operator(operator: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            operator: operator.into(),
        }
    }

    /// Create a [`PersistenceError::OneToOneSoftDeleteConflict`] error
    pub fn one_to_one_conflict(entity_type: impl Into<String>) -> Self {
        Self::OneToOneSoftDeleteConflict {
            entity_type: entity_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_operation_display() {
        assert_eq!(format!("{}", StoreOperation::Count), "count");
        assert_eq!(format!("{}", StoreOperation::Fetch), "fetch");
        assert_eq!(format!("{}", StoreOperation::Save), "save");
        assert_eq!(format!("{}", StoreOperation::Remove), "remove");
        assert_eq!(
            format!("{}", StoreOperation::ResolveRelation),
            "resolve_relation"
        );
    }

    #[test]
    fn test_store_error_kind_display() {
        assert_eq!(
            format!("{}", StoreErrorKind::ConnectionFailed),
            "connection_failed"
        );
        assert_eq!(format!("{}", StoreErrorKind::NotFound), "not_found");
        assert_eq!(
            format!("{}", StoreErrorKind::ConstraintViolation),
            "constraint_violation"
        );
        assert_eq!(
            format!("{}", StoreErrorKind::QueryRejected),
            "query_rejected"
        );
        assert_eq!(format!("{}", StoreErrorKind::Timeout), "timeout");
        assert_eq!(format!("{}", StoreErrorKind::Other), "other");
    }

    #[test]
    fn test_store_error_with_context() {
        let error = StoreError::query_rejected("unknown field `agee`")
            .with_context("User")
            .with_operation(StoreOperation::Count);
        assert_eq!(error.operation, StoreOperation::Count);
        assert_eq!(error.context, Some("User".to_string()));
    }

    #[test]
    fn test_store_error_display() {
        let error = StoreError::constraint_violation(StoreOperation::Save, "unique index")
            .with_context("users.email");
        let display = format!("{}", error);
        assert!(display.contains("constraint_violation"));
        assert!(display.contains("save"));
        assert!(display.contains("[users.email]"));
    }

    #[test]
    fn test_is_retriable() {
        assert!(StoreError::connection_failed("refused").is_retriable());
        assert!(StoreError::timeout(StoreOperation::Fetch, "30s").is_retriable());
        assert!(!StoreError::query_rejected("bad field").is_retriable());
        assert!(
            !StoreError::constraint_violation(StoreOperation::Save, "unique").is_retriable()
        );
    }

    #[test]
    fn test_invalid_page_range_message() {
        let error = PersistenceError::invalid_page_range(5, 2);
        assert_eq!(
            error.to_string(),
            "invalid page range: from 5 cannot be greater than index 2"
        );
    }

    #[test]
    fn test_unsupported_operator_message() {
        let error = PersistenceError::unsupported_operator("matches");
        assert!(error.to_string().contains("matches"));
    }

    #[test]
    fn test_store_error_converts() {
        let error: PersistenceError = StoreError::connection_failed("refused").into();
        assert!(matches!(error, PersistenceError::Store(_)));
    }

    #[test]
    fn test_one_to_one_conflict_message() {
        let error = PersistenceError::one_to_one_conflict("UserProfile");
        assert!(error.to_string().contains("UserProfile"));
        assert!(error.to_string().contains("one-to-one"));
    }
}
