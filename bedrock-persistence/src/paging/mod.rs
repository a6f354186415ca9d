//! Pagination model and engine
//!
//! [`Paginate`] is the result-window value type; [`ToPaginate`] windows
//! in-memory sequences, and [`QuerySource`]/[`AsyncQuerySource`] let
//! lazily-evaluated sources (anything that can count and fetch a window)
//! participate without materializing the full result set.

mod model;
mod paginate;

pub use model::Paginate;
pub use paginate::{
    paginate_source, paginate_source_async, AsyncQuerySource, QuerySource, ToPaginate,
};
