//! Proximity search over directory records.
//!
//! The engine merges two candidate streams: rows the store can rank with its
//! own spatial predicate, and rows without native geometry whose location is
//! recovered by [`CoordinateExtractor`](crate::domains::locations::CoordinateExtractor)
//! and measured in-process.

pub mod engine;
pub mod query;
pub mod store;

use thiserror::Error;

pub use engine::{rank, ProximitySearchEngine, SearchPage};
pub use query::{
    contains_ignore_case, like_pattern, parse_origin, parse_radius, AttributeFilters, SearchQuery,
    DEFAULT_RADIUS,
};
pub use store::{Locatable, ProximityStore, Ranked, StoreError};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidParameter(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}
