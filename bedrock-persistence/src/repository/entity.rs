//! Entity identity and timestamp metadata
//!
//! Every entity managed by a [`Repository`](super::Repository) carries three
//! timestamps: `created_at` (set exactly once, on add), `updated_at` (set on
//! every mutation), and `deleted_at` (presence marks the row logically
//! deleted). `deleted_at` is monotonic: once set, this subsystem never clears
//! it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp metadata carried by every managed entity
pub trait EntityTimestamps {
    /// When the entity was created
    fn created_at(&self) -> DateTime<Utc>;

    /// Set the creation timestamp; called once, by `add`
    fn set_created_at(&mut self, at: DateTime<Utc>);

    /// When the entity was last mutated, if ever
    fn updated_at(&self) -> Option<DateTime<Utc>>;

    /// Set the mutation timestamp; called by `update`
    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// When the entity was logically deleted, if ever
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    /// Set the deletion timestamp; called by the soft-delete engine
    fn set_deleted_at(&mut self, at: DateTime<Utc>);
}

/// Base entity: an opaque key plus the three timestamps
///
/// Domain types typically embed this and delegate their
/// [`EntityTimestamps`] implementation to it.
///
/// # Example
///
/// ```rust
/// use bedrock_persistence::repository::Entity;
/// use uuid::Uuid;
///
/// let entity = Entity::new(Uuid::new_v4());
/// assert!(entity.updated_at.is_none());
/// assert!(entity.deleted_at.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity<Id> {
    /// Opaque primary key
    pub id: Id,
    /// When the entity was created
    pub created_at: DateTime<Utc>,
    /// When the entity was last mutated
    pub updated_at: Option<DateTime<Utc>>,
    /// When the entity was logically deleted
    pub deleted_at: Option<DateTime<Utc>>,
}

impl<Id> Entity<Id> {
    /// Create a new entity with the given key
    ///
    /// `created_at` is provisional here; `Repository::add` stamps the
    /// authoritative value at persist time.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Whether the entity is logically deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl<Id> EntityTimestamps for Entity<Id> {
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn set_updated_at(&mut self, at: DateTime<Utc>) {
        self.updated_at = Some(at);
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: DateTime<Utc>) {
        self.deleted_at = Some(at);
    }
}
