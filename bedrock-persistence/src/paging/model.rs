//! The pagination result window
//!
//! # Example
//!
//! ```rust
//! use bedrock_persistence::paging::{Paginate, ToPaginate};
//!
//! let rows: Vec<i32> = (0..23).collect();
//! let page = rows.to_paginate(1, 10).unwrap();
//!
//! assert_eq!(page.count, 23);
//! assert_eq!(page.pages, 3);
//! assert_eq!(page.items, (10..20).collect::<Vec<_>>());
//! assert!(page.has_previous());
//! assert!(page.has_next());
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, Result};

/// A single result window over a counted source
///
/// `index` is the requested page number, `from` the baseline page offset
/// (pages are numbered starting at `from`), `count` the total number of
/// matching items across all pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paginate<T> {
    /// Baseline page offset
    pub from: u32,
    /// Requested page number
    pub index: u32,
    /// Page length
    pub size: u32,
    /// Total matching items
    pub count: u64,
    /// Total pages, `ceil(count / size)`
    pub pages: u32,
    /// The windowed slice
    pub items: Vec<T>,
}

impl<T> Paginate<T> {
    /// Window an already-materialized sequence
    ///
    /// Skips `(index - from) * size` items and takes `size`.
    ///
    /// # Errors
    ///
    /// Fails with [`PersistenceError::InvalidPageRange`] when `from > index`.
    pub fn from_items(
        items: impl IntoIterator<Item = T>,
        index: u32,
        size: u32,
        from: u32,
    ) -> Result<Self> {
        let all: Vec<T> = items.into_iter().collect();
        let count = all.len() as u64;
        let (skip, take) = window_bounds(index, size, from)?;
        let items: Vec<T> = all
            .into_iter()
            .skip(skip as usize)
            .take(take as usize)
            .collect();
        Ok(Self {
            from,
            index,
            size,
            count,
            pages: page_count(count, size),
            items,
        })
    }

    /// Assemble a page from an externally counted and windowed source
    ///
    /// # Errors
    ///
    /// Fails with [`PersistenceError::InvalidPageRange`] when `from > index`.
    pub fn from_window(
        items: Vec<T>,
        count: u64,
        index: u32,
        size: u32,
        from: u32,
    ) -> Result<Self> {
        if from > index {
            return Err(PersistenceError::invalid_page_range(from, index));
        }
        Ok(Self {
            from,
            index,
            size,
            count,
            pages: page_count(count, size),
            items,
        })
    }

    /// An empty page: zero count, zero pages, no items, no source touched
    pub fn empty() -> Self {
        Self {
            from: 0,
            index: 0,
            size: 0,
            count: 0,
            pages: 0,
            items: Vec::new(),
        }
    }

    /// Whether a page exists before this one
    pub fn has_previous(&self) -> bool {
        self.index.saturating_sub(self.from) > 0
    }

    /// Whether a further full or partial page exists
    pub fn has_next(&self) -> bool {
        self.index.saturating_sub(self.from) + 1 < self.pages
    }

    /// Re-wrap this page with a per-item converter
    ///
    /// Preserves `index`, `size`, `from`, `count`, and `pages`; only `items`
    /// are transformed. No source is re-queried.
    pub fn map<R>(self, converter: impl FnMut(T) -> R) -> Paginate<R> {
        Paginate {
            from: self.from,
            index: self.index,
            size: self.size,
            count: self.count,
            pages: self.pages,
            items: self.items.into_iter().map(converter).collect(),
        }
    }
}

/// Compute `skip`/`take` for a window, validating the page range
pub(crate) fn window_bounds(index: u32, size: u32, from: u32) -> Result<(u64, u64)> {
    if from > index {
        return Err(PersistenceError::invalid_page_range(from, index));
    }
    let skip = u64::from(index - from) * u64::from(size);
    Ok((skip, u64::from(size)))
}

/// Total pages for a count at a given page size
///
/// A zero size yields zero pages rather than dividing by zero; callers clamp
/// sizes through [`PagingConfig`](crate::config::PagingConfig) beforehand.
pub(crate) fn page_count(count: u64, size: u32) -> u32 {
    if size == 0 {
        return 0;
    }
    count.div_ceil(u64::from(size)) as u32
}
