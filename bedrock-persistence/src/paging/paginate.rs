//! Windowing over in-memory sequences and lazily-evaluated sources
//!
//! Both execution modes share the same skip/take arithmetic, so the
//! synchronous and asynchronous paths cannot drift apart.

use std::future::Future;

use crate::error::{Result, StoreError};

use super::model::{page_count, window_bounds, Paginate};

/// Windowing extension for in-memory sequences
pub trait ToPaginate<T> {
    /// Window this sequence with a baseline offset of zero
    fn to_paginate(&self, index: u32, size: u32) -> Result<Paginate<T>>;

    /// Window this sequence with an explicit baseline offset
    fn to_paginate_from(&self, index: u32, size: u32, from: u32) -> Result<Paginate<T>>;

    /// Window this sequence and convert the page's items
    fn to_paginate_map<R>(
        &self,
        converter: impl FnMut(&T) -> R,
        index: u32,
        size: u32,
    ) -> Result<Paginate<R>>;

    /// Window this sequence with an explicit baseline offset and convert the
    /// page's items
    fn to_paginate_map_from<R>(
        &self,
        converter: impl FnMut(&T) -> R,
        index: u32,
        size: u32,
        from: u32,
    ) -> Result<Paginate<R>>;
}

impl<T: Clone> ToPaginate<T> for [T] {
    fn to_paginate(&self, index: u32, size: u32) -> Result<Paginate<T>> {
        self.to_paginate_from(index, size, 0)
    }

    fn to_paginate_from(&self, index: u32, size: u32, from: u32) -> Result<Paginate<T>> {
        let (skip, take) = window_bounds(index, size, from)?;
        let items: Vec<T> = self
            .iter()
            .skip(skip as usize)
            .take(take as usize)
            .cloned()
            .collect();
        Paginate::from_window(items, self.len() as u64, index, size, from)
    }

    fn to_paginate_map<R>(
        &self,
        converter: impl FnMut(&T) -> R,
        index: u32,
        size: u32,
    ) -> Result<Paginate<R>> {
        self.to_paginate_map_from(converter, index, size, 0)
    }

    fn to_paginate_map_from<R>(
        &self,
        converter: impl FnMut(&T) -> R,
        index: u32,
        size: u32,
        from: u32,
    ) -> Result<Paginate<R>> {
        let (skip, take) = window_bounds(index, size, from)?;
        let items: Vec<R> = self
            .iter()
            .skip(skip as usize)
            .take(take as usize)
            .map(converter)
            .collect();
        Paginate::from_window(items, self.len() as u64, index, size, from)
    }
}

/// A lazily-evaluated, countable, windowable source (blocking)
///
/// Satisfied by anything that can answer a count query and fetch a
/// contiguous window; the full result set is never materialized here.
pub trait QuerySource<T> {
    /// Count the total items this source would yield
    fn count(&self) -> std::result::Result<u64, StoreError>;

    /// Fetch `take` items after skipping `skip`
    fn window(&self, skip: u64, take: u64) -> std::result::Result<Vec<T>, StoreError>;
}

/// A lazily-evaluated, countable, windowable source (suspending)
///
/// Must behave identically to the blocking form for identical inputs; the
/// futures suspend at each store round-trip instead of blocking a worker
/// thread.
pub trait AsyncQuerySource<T>: Send + Sync {
    /// Count the total items this source would yield
    fn count(&self) -> impl Future<Output = std::result::Result<u64, StoreError>> + Send;

    /// Fetch `take` items after skipping `skip`
    fn window(
        &self,
        skip: u64,
        take: u64,
    ) -> impl Future<Output = std::result::Result<Vec<T>, StoreError>> + Send;
}

/// Paginate a lazily-evaluated source: one count query, one window query
pub fn paginate_source<T>(
    source: &impl QuerySource<T>,
    index: u32,
    size: u32,
    from: u32,
) -> Result<Paginate<T>> {
    let (skip, take) = window_bounds(index, size, from)?;
    let count = source.count()?;
    let items = source.window(skip, take)?;
    Ok(Paginate {
        from,
        index,
        size,
        count,
        pages: page_count(count, size),
        items,
    })
}

/// Paginate a lazily-evaluated source without blocking a worker thread
///
/// Same count-then-window sequence and the same windowing arithmetic as
/// [`paginate_source`].
pub async fn paginate_source_async<T>(
    source: &impl AsyncQuerySource<T>,
    index: u32,
    size: u32,
    from: u32,
) -> Result<Paginate<T>> {
    let (skip, take) = window_bounds(index, size, from)?;
    let count = source.count().await?;
    let items = source.window(skip, take).await?;
    Ok(Paginate {
        from,
        index,
        size,
        count,
        pages: page_count(count, size),
        items,
    })
}
