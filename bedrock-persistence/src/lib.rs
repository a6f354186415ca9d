//! # bedrock-persistence
//!
//! Storage-agnostic data-access layer: offset pagination, runtime-defined
//! filtering and sorting, and a generic repository with cascading soft
//! deletes. Works equally well over an in-memory store and a database-backed
//! one; the core never speaks to a storage backend directly.
//!
//! ## Features
//!
//! - **Pagination**: windowing over in-memory sequences and lazily-evaluated
//!   sources, with identical arithmetic in blocking and suspending form
//! - **Dynamics**: a data-only filter/sort model compiled into a
//!   parameterized restriction, safe for caller-supplied input
//! - **Repository**: single-row lookup, paginated listing, timestamp-stamping
//!   writes, existence checks
//! - **Soft deletion**: a cascading engine over a declared relationship
//!   graph, with a one-to-one guard and deferred relation resolution
//!
//! ## Example
//!
//! ```rust,no_run
//! use bedrock_persistence::prelude::*;
//!
//! fn main() -> Result<()> {
//!     // Load configuration
//!     let config = PersistenceConfig::load()?;
//!
//!     // Initialize tracing
//!     init_tracing(&config)?;
//!
//!     // Window an in-memory sequence
//!     let rows: Vec<i32> = (0..23).collect();
//!     let page = rows.to_paginate(1, config.paging.default_page_size)?;
//!     println!("{} of {} rows", page.items.len(), page.count);
//!
//!     // Compile a caller-supplied restriction
//!     let dynamic = Dynamic::filtered(Filter::eq("status", "active"))
//!         .with_sorts(vec![Sort::desc("created_at")]);
//!     let restriction = compile(&dynamic)?;
//!     assert_eq!(restriction.clause.as_deref(), Some("status = @0"));
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dynamics;
pub mod error;
pub mod paging;
pub mod repository;

/// Convenience re-exports for common usage
pub mod prelude {
    pub use crate::config::{init_tracing, PagingConfig, PersistenceConfig};
    pub use crate::dynamics::{compile, Dynamic, Filter, Restriction, Sort, SortDirection};
    pub use crate::error::{PersistenceError, Result, StoreError, StoreErrorKind, StoreOperation};
    pub use crate::paging::{
        paginate_source, paginate_source_async, AsyncQuerySource, Paginate, QuerySource,
        ToPaginate,
    };
    pub use crate::repository::{
        AsyncEntityStore, AsyncRelationResolver, CascadeOutcome, DeleteBehavior, Entity,
        EntityNode, EntityStore, EntityTimestamps, ListOptions, QueryOptions, RelationMeta,
        RelationQuery, RelationResolver, Repository, StoreQuery, Window,
    };
}
