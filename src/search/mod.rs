//! Global search
//!
//! A free-text query is fanned out to nine partial-match lookups, one per
//! searchable collection, and the hits are concatenated in a fixed order.

mod aggregator;
mod backend;
mod debounce;

pub use aggregator::{SearchAggregator, SearchError, SearchHit, SearchKind, SearchResults};
pub use backend::{DbSearchBackend, SearchBackend};
pub use debounce::run_debounced;
