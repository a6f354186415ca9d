//! The generic repository
//!
//! A [`Repository`] wraps one store handle and exposes the full data-access
//! surface for one entity type: single-row lookup, paginated listing (plain
//! and dynamic), timestamp-stamping writes, and soft deletion through the
//! cascade engine. Like the store handle it wraps, a repository is scoped to
//! one logical request; it is cheap to construct and holds no caches.

use std::marker::PhantomData;

use chrono::Utc;
use tracing::debug;

use crate::config::PagingConfig;
use crate::dynamics::{compile, Dynamic, Sort};
use crate::error::Result;
use crate::paging::{
    paginate_source, paginate_source_async, AsyncQuerySource, Paginate, QuerySource,
};

use super::entity::EntityTimestamps;
use super::relations::{AsyncRelationResolver, EntityNode, RelationResolver};
use super::soft_delete::{cascade_soft_delete, cascade_soft_delete_async};
use super::store::{AsyncEntityStore, EntityStore, StoreQuery, StoreResult, Window};

/// Options shared by single-row reads
pub struct QueryOptions<'a> {
    /// Related-data inclusion directive, passed through to the store
    pub include: &'a [&'a str],
    /// Whether logically deleted rows participate
    pub with_deleted: bool,
    /// Whether the store should change-track fetched rows
    pub tracking: bool,
}

impl Default for QueryOptions<'_> {
    fn default() -> Self {
        Self {
            include: &[],
            with_deleted: false,
            tracking: true,
        }
    }
}

/// Options for paginated listings
///
/// A `size` of zero falls back to the configured default page size; sizes
/// above the configured maximum are clamped down to it.
pub struct ListOptions<'a, T> {
    /// In-process predicate restriction
    pub predicate: Option<&'a (dyn Fn(&T) -> bool + Send + Sync)>,
    /// Typed ordering keys, most significant first
    pub order_by: Option<&'a [Sort]>,
    /// Related-data inclusion directive, passed through to the store
    pub include: &'a [&'a str],
    /// Whether logically deleted rows participate
    pub with_deleted: bool,
    /// Whether the store should change-track fetched rows
    pub tracking: bool,
    /// Requested page number, starting at zero
    pub index: u32,
    /// Requested page length; zero means the configured default
    pub size: u32,
}

impl<T> Default for ListOptions<'_, T> {
    fn default() -> Self {
        Self {
            predicate: None,
            order_by: None,
            include: &[],
            with_deleted: false,
            tracking: true,
            index: 0,
            size: 0,
        }
    }
}

/// Generic repository over one entity type and one store handle
pub struct Repository<T, S> {
    store: S,
    paging: PagingConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T, S> Repository<T, S> {
    /// Wrap a store handle with default paging bounds
    pub fn new(store: S) -> Self {
        Self::with_paging(store, PagingConfig::default())
    }

    /// Wrap a store handle with explicit paging bounds
    pub fn with_paging(store: S, paging: PagingConfig) -> Self {
        Self {
            store,
            paging,
            _entity: PhantomData,
        }
    }

    /// Access the wrapped store handle
    pub fn store(&self) -> &S {
        &self.store
    }

    fn list_query<'a>(&self, options: &'a ListOptions<'a, T>) -> StoreQuery<'a, T> {
        StoreQuery {
            predicate: options.predicate,
            restriction: None,
            order_by: options.order_by,
            with_deleted: options.with_deleted,
            include: options.include,
            tracking: options.tracking,
        }
    }
}

/// Adapter presenting a store query as a countable, windowable source
struct StoreSource<'a, T, S> {
    store: &'a S,
    query: &'a StoreQuery<'a, T>,
}

impl<T: EntityTimestamps, S: EntityStore<T>> QuerySource<T> for StoreSource<'_, T, S> {
    fn count(&self) -> StoreResult<u64> {
        self.store.count(self.query)
    }

    fn window(&self, skip: u64, take: u64) -> StoreResult<Vec<T>> {
        self.store.fetch(self.query, Some(Window { skip, take }))
    }
}

impl<T, S> AsyncQuerySource<T> for StoreSource<'_, T, S>
where
    T: EntityTimestamps + Send,
    S: AsyncEntityStore<T>,
{
    async fn count(&self) -> StoreResult<u64> {
        self.store.count(self.query).await
    }

    async fn window(&self, skip: u64, take: u64) -> StoreResult<Vec<T>> {
        self.store.fetch(self.query, Some(Window { skip, take })).await
    }
}

impl<T, S> Repository<T, S>
where
    T: EntityTimestamps,
    S: EntityStore<T>,
{
    /// Fetch the first row matching the predicate, if any
    pub fn get(
        &self,
        predicate: &(dyn Fn(&T) -> bool + Send + Sync),
        options: &QueryOptions<'_>,
    ) -> Result<Option<T>> {
        let query = StoreQuery {
            predicate: Some(predicate),
            with_deleted: options.with_deleted,
            include: options.include,
            tracking: options.tracking,
            ..StoreQuery::default()
        };
        let mut rows = self
            .store
            .fetch(&query, Some(Window { skip: 0, take: 1 }))?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Fetch one page of rows
    pub fn list(&self, options: &ListOptions<'_, T>) -> Result<Paginate<T>> {
        let query = self.list_query(options);
        let size = self.paging.clamp_size(options.size);
        let source = StoreSource {
            store: &self.store,
            query: &query,
        };
        paginate_source(&source, options.index, size, 0)
    }

    /// Fetch one page of rows restricted by a caller-supplied dynamic
    ///
    /// The dynamic is compiled before any store round-trip; an unsupported
    /// operator fails here without touching the store.
    pub fn list_by_dynamic(
        &self,
        dynamic: &Dynamic,
        options: &ListOptions<'_, T>,
    ) -> Result<Paginate<T>> {
        let restriction = compile(dynamic)?;
        let mut query = self.list_query(options);
        query.restriction = Some(&restriction);
        let size = self.paging.clamp_size(options.size);
        let source = StoreSource {
            store: &self.store,
            query: &query,
        };
        paginate_source(&source, options.index, size, 0)
    }

    /// Whether any row matches the predicate
    pub fn exists(
        &self,
        predicate: Option<&(dyn Fn(&T) -> bool + Send + Sync)>,
        options: &QueryOptions<'_>,
    ) -> Result<bool> {
        let query = StoreQuery {
            predicate,
            with_deleted: options.with_deleted,
            tracking: options.tracking,
            ..StoreQuery::default()
        };
        Ok(self.store.count(&query)? > 0)
    }

    /// Persist a new entity, stamping `created_at`
    pub fn add(&self, mut entity: T) -> Result<T> {
        entity.set_created_at(Utc::now());
        self.store.save(std::slice::from_ref(&entity))?;
        Ok(entity)
    }

    /// Persist a batch of new entities, stamping one shared `created_at`
    pub fn add_many(&self, mut entities: Vec<T>) -> Result<Vec<T>> {
        let now = Utc::now();
        for entity in &mut entities {
            entity.set_created_at(now);
        }
        self.store.save(&entities)?;
        Ok(entities)
    }

    /// Persist a mutated entity, stamping `updated_at`
    pub fn update(&self, mut entity: T) -> Result<T> {
        entity.set_updated_at(Utc::now());
        self.store.save(std::slice::from_ref(&entity))?;
        Ok(entity)
    }

    /// Persist a batch of mutated entities, stamping one shared `updated_at`
    pub fn update_many(&self, mut entities: Vec<T>) -> Result<Vec<T>> {
        let now = Utc::now();
        for entity in &mut entities {
            entity.set_updated_at(now);
        }
        self.store.save(&entities)?;
        Ok(entities)
    }
}

impl<T, S> Repository<T, S>
where
    T: EntityTimestamps + EntityNode,
    S: EntityStore<T> + RelationResolver,
{
    /// Delete an entity, logically by default
    ///
    /// With `permanent` set the row is physically removed and no cascade
    /// runs. Otherwise the cascade engine stamps the entity and every
    /// reachable cascading descendant, and the whole mutated graph is
    /// persisted in one step.
    pub fn soft_delete(&self, mut entity: T, permanent: bool) -> Result<T> {
        if permanent {
            self.store.remove(&entity)?;
            return Ok(entity);
        }
        let outcome = cascade_soft_delete(&mut entity, &self.store, Utc::now())?;
        debug!(
            entity_type = entity.entity_type(),
            marked = outcome.marked,
            resolved = outcome.resolved.len(),
            "soft delete cascade complete"
        );
        self.store.save_graph(&entity, &outcome.resolved)?;
        Ok(entity)
    }

    /// Delete a batch of entities, logically by default
    ///
    /// Entities are processed in order; the first failure stops the batch.
    pub fn soft_delete_many(&self, entities: Vec<T>, permanent: bool) -> Result<Vec<T>> {
        let mut deleted = Vec::with_capacity(entities.len());
        for entity in entities {
            deleted.push(self.soft_delete(entity, permanent)?);
        }
        Ok(deleted)
    }
}

impl<T, S> Repository<T, S>
where
    T: EntityTimestamps + Send,
    S: AsyncEntityStore<T>,
{
    /// Fetch the first row matching the predicate, without blocking
    pub async fn get_async(
        &self,
        predicate: &(dyn Fn(&T) -> bool + Send + Sync),
        options: &QueryOptions<'_>,
    ) -> Result<Option<T>> {
        let query = StoreQuery {
            predicate: Some(predicate),
            with_deleted: options.with_deleted,
            include: options.include,
            tracking: options.tracking,
            ..StoreQuery::default()
        };
        let mut rows = self
            .store
            .fetch(&query, Some(Window { skip: 0, take: 1 }))
            .await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Fetch one page of rows, without blocking
    pub async fn list_async(&self, options: &ListOptions<'_, T>) -> Result<Paginate<T>> {
        let query = self.list_query(options);
        let size = self.paging.clamp_size(options.size);
        let source = StoreSource {
            store: &self.store,
            query: &query,
        };
        paginate_source_async(&source, options.index, size, 0).await
    }

    /// Fetch one page of rows restricted by a dynamic, without blocking
    pub async fn list_by_dynamic_async(
        &self,
        dynamic: &Dynamic,
        options: &ListOptions<'_, T>,
    ) -> Result<Paginate<T>> {
        let restriction = compile(dynamic)?;
        let mut query = self.list_query(options);
        query.restriction = Some(&restriction);
        let size = self.paging.clamp_size(options.size);
        let source = StoreSource {
            store: &self.store,
            query: &query,
        };
        paginate_source_async(&source, options.index, size, 0).await
    }

    /// Whether any row matches the predicate, without blocking
    pub async fn exists_async(
        &self,
        predicate: Option<&(dyn Fn(&T) -> bool + Send + Sync)>,
        options: &QueryOptions<'_>,
    ) -> Result<bool> {
        let query = StoreQuery {
            predicate,
            with_deleted: options.with_deleted,
            tracking: options.tracking,
            ..StoreQuery::default()
        };
        Ok(self.store.count(&query).await? > 0)
    }

    /// Persist a new entity, stamping `created_at`, without blocking
    pub async fn add_async(&self, mut entity: T) -> Result<T> {
        entity.set_created_at(Utc::now());
        self.store.save(std::slice::from_ref(&entity)).await?;
        Ok(entity)
    }

    /// Persist a batch of new entities, without blocking
    pub async fn add_many_async(&self, mut entities: Vec<T>) -> Result<Vec<T>> {
        let now = Utc::now();
        for entity in &mut entities {
            entity.set_created_at(now);
        }
        self.store.save(&entities).await?;
        Ok(entities)
    }

    /// Persist a mutated entity, stamping `updated_at`, without blocking
    pub async fn update_async(&self, mut entity: T) -> Result<T> {
        entity.set_updated_at(Utc::now());
        self.store.save(std::slice::from_ref(&entity)).await?;
        Ok(entity)
    }

    /// Persist a batch of mutated entities, without blocking
    pub async fn update_many_async(&self, mut entities: Vec<T>) -> Result<Vec<T>> {
        let now = Utc::now();
        for entity in &mut entities {
            entity.set_updated_at(now);
        }
        self.store.save(&entities).await?;
        Ok(entities)
    }
}

impl<T, S> Repository<T, S>
where
    T: EntityTimestamps + EntityNode,
    S: AsyncEntityStore<T> + AsyncRelationResolver,
{
    /// Delete an entity, logically by default, without blocking
    pub async fn soft_delete_async(&self, mut entity: T, permanent: bool) -> Result<T> {
        if permanent {
            self.store.remove(&entity).await?;
            return Ok(entity);
        }
        let outcome = cascade_soft_delete_async(&mut entity, &self.store, Utc::now()).await?;
        debug!(
            entity_type = entity.entity_type(),
            marked = outcome.marked,
            resolved = outcome.resolved.len(),
            "soft delete cascade complete"
        );
        self.store.save_graph(&entity, &outcome.resolved).await?;
        Ok(entity)
    }

    /// Delete a batch of entities, logically by default, without blocking
    pub async fn soft_delete_many_async(
        &self,
        entities: Vec<T>,
        permanent: bool,
    ) -> Result<Vec<T>> {
        let mut deleted = Vec::with_capacity(entities.len());
        for entity in entities {
            deleted.push(self.soft_delete_async(entity, permanent).await?);
        }
        Ok(deleted)
    }
}
