//! Runtime-defined filtering and sorting
//!
//! A [`Dynamic`] is a data-only description of query restrictions, typically
//! decoded from a request body: an optional [`Filter`] tree plus an ordered
//! list of [`Sort`] keys. The compiler in [`query`] turns it into an
//! executable [`Restriction`] without any per-entity query code.

mod filter;
pub mod query;
mod sort;

pub use filter::Filter;
pub use query::{compile, Restriction};
pub use sort::{Sort, SortDirection};

use serde::{Deserialize, Serialize};

/// A runtime-supplied filter/sort request
///
/// Either half may be absent, in which case that step is a no-op. Sort order
/// is significant: the keys form a composite ordering, applied left to right.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dynamic {
    /// Root of the filter tree
    #[serde(default)]
    pub filter: Option<Filter>,

    /// Composite ordering keys, most significant first
    #[serde(default)]
    pub sorts: Vec<Sort>,
}

impl Dynamic {
    /// A dynamic with a filter and no ordering
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            sorts: Vec::new(),
        }
    }

    /// A dynamic with ordering only
    pub fn sorted(sorts: Vec<Sort>) -> Self {
        Self {
            filter: None,
            sorts,
        }
    }

    /// Attach ordering keys
    #[must_use]
    pub fn with_sorts(mut self, sorts: Vec<Sort>) -> Self {
        self.sorts = sorts;
        self
    }
}
