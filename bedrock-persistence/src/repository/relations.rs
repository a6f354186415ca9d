//! Relationship metadata for the cascading soft-delete engine
//!
//! The engine never inspects a storage backend directly. Instead, each
//! backend (or entity mapping layer) describes an entity's relationships
//! through [`EntityNode`]: a uniform, type-erased view exposing timestamp
//! access, foreign-key descriptors for the one-to-one guard, and relation
//! slots whose values are either already loaded in memory or deferred to a
//! [`RelationResolver`].

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Delete behavior configured on a relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeleteBehavior {
    /// Deleting the principal propagates to dependents in the store
    Cascade,
    /// Cascade evaluated by the client rather than the store
    ClientCascade,
    /// Dependents keep their rows; the foreign key is nulled
    SetNull,
    /// Deletion is refused while dependents exist
    Restrict,
    /// The store takes no action on dependents
    NoAction,
}

impl DeleteBehavior {
    /// Whether a soft delete of the principal propagates over this behavior
    pub fn cascades(self) -> bool {
        matches!(self, Self::Cascade | Self::ClientCascade)
    }
}

/// One declared relationship of an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMeta {
    /// Relationship name, for diagnostics
    pub name: &'static str,
    /// Whether the navigation holds many related entities
    pub is_collection: bool,
    /// Whether this navigation is declared on the dependent side
    pub is_on_dependent: bool,
    /// Configured delete behavior
    pub delete_behavior: DeleteBehavior,
    /// Whether the target is an owned/embedded value object with no
    /// independent deletion lifecycle
    pub target_is_owned: bool,
}

impl RelationMeta {
    /// Whether the soft-delete cascade follows this relationship
    ///
    /// Only principal-side, cascade-configured, non-owned relationships
    /// propagate the deletion mark.
    pub fn propagates_soft_delete(&self) -> bool {
        !self.is_on_dependent && self.delete_behavior.cascades() && !self.target_is_owned
    }
}

/// One foreign key declared by the entity (the entity as dependent side)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyMeta {
    /// Type declaring the foreign key (the dependent side)
    pub declaring_type: &'static str,
    /// Type the foreign key references (the principal side)
    pub principal_type: &'static str,
    /// Whether the dependent-to-principal navigation is a collection
    pub dependent_is_collection: bool,
    /// Whether the principal-to-dependent navigation is a collection
    pub principal_is_collection: bool,
}

impl ForeignKeyMeta {
    /// A true one-to-one link: neither side is a collection
    pub fn is_one_to_one(&self) -> bool {
        !self.dependent_is_collection && !self.principal_is_collection
    }
}

/// A scoped query for related rows, executed by a [`RelationResolver`]
///
/// Resolvers must return only rows that are not yet logically deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationQuery {
    /// Relationship name on the parent
    pub relation: &'static str,
    /// Type of the parent entity
    pub parent_type: &'static str,
    /// Rendered key of the parent entity
    pub parent_key: String,
    /// Type of the related entity
    pub target_type: &'static str,
}

/// The value held by one relation slot
pub enum RelationValue<'a> {
    /// Related entities already loaded in memory; walked in place
    Loaded(Vec<&'a mut dyn EntityNode>),
    /// Related entities must be resolved from the store
    Deferred(RelationQuery),
}

/// One relationship of a concrete entity instance
pub struct RelationSlot<'a> {
    /// Relationship metadata
    pub meta: RelationMeta,
    /// The related value(s)
    pub value: RelationValue<'a>,
}

/// Type-erased view of an entity for the cascade walk
///
/// Implemented once per storage backend or entity mapping; the engine works
/// exclusively through this trait so entity graphs of mixed types can be
/// traversed uniformly. `Sync` is required so resolved nodes can be shared
/// with a suspending store during the graph save.
pub trait EntityNode: Send + Sync {
    /// Stable type name, used by the one-to-one guard and visited tracking
    fn entity_type(&self) -> &'static str;

    /// Rendered primary key, used for visited tracking on cyclic graphs
    fn entity_key(&self) -> String;

    /// Logical deletion timestamp, if set
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Stamp the logical deletion timestamp
    fn mark_deleted(&mut self, at: DateTime<Utc>);

    /// Foreign keys this entity participates in
    fn foreign_keys(&self) -> Vec<ForeignKeyMeta>;

    /// Declared relationships with their current values
    fn relations(&mut self) -> Vec<RelationSlot<'_>>;
}

/// Resolves deferred relation values from the store (blocking)
pub trait RelationResolver {
    /// Fetch the not-yet-deleted rows the query describes
    ///
    /// Covers both to-many and to-one navigations; a to-one navigation
    /// yields zero or one row.
    fn resolve(
        &self,
        query: &RelationQuery,
    ) -> std::result::Result<Vec<Box<dyn EntityNode>>, StoreError>;
}

/// Resolves deferred relation values from the store (suspending)
pub trait AsyncRelationResolver: Send + Sync {
    /// Fetch the not-yet-deleted rows the query describes
    fn resolve(
        &self,
        query: &RelationQuery,
    ) -> impl Future<Output = std::result::Result<Vec<Box<dyn EntityNode>>, StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(is_on_dependent: bool, behavior: DeleteBehavior, owned: bool) -> RelationMeta {
        RelationMeta {
            name: "children",
            is_collection: true,
            is_on_dependent,
            delete_behavior: behavior,
            target_is_owned: owned,
        }
    }

    #[test]
    fn test_cascading_behaviors() {
        assert!(DeleteBehavior::Cascade.cascades());
        assert!(DeleteBehavior::ClientCascade.cascades());
        assert!(!DeleteBehavior::SetNull.cascades());
        assert!(!DeleteBehavior::Restrict.cascades());
        assert!(!DeleteBehavior::NoAction.cascades());
    }

    #[test]
    fn test_propagation_requires_principal_side_cascade() {
        assert!(meta(false, DeleteBehavior::Cascade, false).propagates_soft_delete());
        assert!(meta(false, DeleteBehavior::ClientCascade, false).propagates_soft_delete());
        assert!(!meta(true, DeleteBehavior::Cascade, false).propagates_soft_delete());
        assert!(!meta(false, DeleteBehavior::Restrict, false).propagates_soft_delete());
    }

    #[test]
    fn test_owned_targets_never_propagate() {
        assert!(!meta(false, DeleteBehavior::Cascade, true).propagates_soft_delete());
    }

    #[test]
    fn test_one_to_one_detection() {
        let fk = ForeignKeyMeta {
            declaring_type: "UserProfile",
            principal_type: "User",
            dependent_is_collection: false,
            principal_is_collection: false,
        };
        assert!(fk.is_one_to_one());

        let fk = ForeignKeyMeta {
            declaring_type: "OrderLine",
            principal_type: "Order",
            dependent_is_collection: false,
            principal_is_collection: true,
        };
        assert!(!fk.is_one_to_one());
    }
}
