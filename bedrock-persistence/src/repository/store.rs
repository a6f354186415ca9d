//! The store boundary
//!
//! A store is a database session or connection scoped to one logical
//! request; handles are never shared across concurrent callers, and all
//! operations within a request execute sequentially against the handle.
//! Store implementations apply a [`StoreQuery`] in a fixed pipeline order:
//! related-data inclusion first, then the deletion filter, then the
//! predicate/restriction, then ordering, then any window.

use std::future::Future;

use crate::dynamics::{Restriction, Sort};
use crate::error::StoreError;

use super::entity::EntityTimestamps;
use super::relations::EntityNode;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A borrowed, request-scoped query description
///
/// `include` and `tracking` are pass-through configuration for the backend
/// (eager-loading directives and change-tracking control); the core never
/// interprets them.
pub struct StoreQuery<'a, T> {
    /// In-process predicate restriction
    pub predicate: Option<&'a (dyn Fn(&T) -> bool + Send + Sync)>,
    /// Compiled dynamic restriction, including its own ordering
    pub restriction: Option<&'a Restriction>,
    /// Typed ordering keys, most significant first
    pub order_by: Option<&'a [Sort]>,
    /// Whether logically deleted rows participate
    pub with_deleted: bool,
    /// Related-data inclusion directive (relationship names)
    pub include: &'a [&'a str],
    /// Whether the backend should change-track fetched rows
    pub tracking: bool,
}

impl<T> Default for StoreQuery<'_, T> {
    fn default() -> Self {
        Self {
            predicate: None,
            restriction: None,
            order_by: None,
            with_deleted: false,
            include: &[],
            tracking: true,
        }
    }
}

impl<'a, T> StoreQuery<'a, T> {
    /// Restrict with an in-process predicate
    #[must_use]
    pub fn with_predicate(mut self, predicate: &'a (dyn Fn(&T) -> bool + Send + Sync)) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Restrict with a compiled dynamic
    #[must_use]
    pub fn with_restriction(mut self, restriction: &'a Restriction) -> Self {
        self.restriction = Some(restriction);
        self
    }
}

/// A contiguous fetch window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Rows to skip
    pub skip: u64,
    /// Rows to take
    pub take: u64,
}

/// Blocking store operations for one entity type
pub trait EntityStore<T: EntityTimestamps>: Send + Sync {
    /// Count rows matching the query
    fn count(&self, query: &StoreQuery<'_, T>) -> StoreResult<u64>;

    /// Fetch rows matching the query, optionally windowed
    fn fetch(&self, query: &StoreQuery<'_, T>, window: Option<Window>) -> StoreResult<Vec<T>>;

    /// Persist new or mutated entities
    fn save(&self, entities: &[T]) -> StoreResult<()>;

    /// Physically remove a row
    fn remove(&self, entity: &T) -> StoreResult<()>;

    /// Persist a soft-deleted root together with every store-resolved
    /// descendant the cascade mutated, as one unit
    ///
    /// This is the single durability point of a soft delete: either the
    /// whole graph is persisted or none of it is.
    fn save_graph(&self, root: &T, related: &[Box<dyn EntityNode>]) -> StoreResult<()>;
}

/// Suspending store operations for one entity type
///
/// Behaviorally identical to [`EntityStore`]; the futures suspend at each
/// store round-trip instead of blocking a worker thread.
pub trait AsyncEntityStore<T: EntityTimestamps>: Send + Sync {
    /// Count rows matching the query
    fn count(&self, query: &StoreQuery<'_, T>) -> impl Future<Output = StoreResult<u64>> + Send;

    /// Fetch rows matching the query, optionally windowed
    fn fetch(
        &self,
        query: &StoreQuery<'_, T>,
        window: Option<Window>,
    ) -> impl Future<Output = StoreResult<Vec<T>>> + Send;

    /// Persist new or mutated entities
    fn save(&self, entities: &[T]) -> impl Future<Output = StoreResult<()>> + Send;

    /// Physically remove a row
    fn remove(&self, entity: &T) -> impl Future<Output = StoreResult<()>> + Send;

    /// Persist a soft-deleted root and its mutated descendants as one unit
    fn save_graph(
        &self,
        root: &T,
        related: &[Box<dyn EntityNode>],
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Entity;

    #[test]
    fn test_default_query_excludes_deleted_and_tracks() {
        let query: StoreQuery<'_, Entity<u32>> = StoreQuery::default();
        assert!(!query.with_deleted);
        assert!(query.tracking);
        assert!(query.predicate.is_none());
        assert!(query.restriction.is_none());
        assert!(query.include.is_empty());
    }

    #[test]
    fn test_query_builders() {
        let predicate = |entity: &Entity<u32>| entity.id > 3;
        let restriction = Restriction::default();
        let query = StoreQuery::default()
            .with_predicate(&predicate)
            .with_restriction(&restriction);
        assert!(query.predicate.is_some());
        assert!(query.restriction.is_some());
    }
}
