//! The repository surface
//!
//! Ties the store boundary, the entity timestamp model, the relationship
//! graph, and the cascading soft-delete engine together behind a generic
//! [`Repository`].

mod base;
mod entity;
mod relations;
mod soft_delete;
mod store;

pub use base::{ListOptions, QueryOptions, Repository};
pub use entity::{Entity, EntityTimestamps};
pub use relations::{
    AsyncRelationResolver, DeleteBehavior, EntityNode, ForeignKeyMeta, RelationMeta,
    RelationQuery, RelationResolver, RelationSlot, RelationValue,
};
pub use soft_delete::{
    cascade_soft_delete, cascade_soft_delete_async, check_one_to_one, CascadeOutcome,
};
pub use store::{AsyncEntityStore, EntityStore, StoreQuery, StoreResult, Window};
