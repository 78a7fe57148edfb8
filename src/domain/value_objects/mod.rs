//! # Value Objects
//!
//! Immutable request and response descriptors.
//!
//! - [`SearchCriteria`]: the caller's query with optional [`FilterOption`]
//!   and [`SortOption`]
//! - [`Metadata`]: provider and cache statistics for a response

pub mod metadata;
pub mod search_criteria;

pub use metadata::Metadata;
pub use search_criteria::{FilterOption, SearchCriteria, SortField, SortOption};
