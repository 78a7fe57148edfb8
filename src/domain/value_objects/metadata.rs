//! # Search Metadata
//!
//! Summary of how a response was produced.

use serde::{Deserialize, Serialize};

/// Provider and cache statistics attached to every search response.
///
/// The provider counts are fixed when offers are fetched and are stored in
/// the cache alongside them. `total_results`, `search_time_ms` and
/// `cache_hit` describe the current response and are always recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Number of offers in the response.
    pub total_results: usize,
    /// Number of providers called.
    pub providers_queried: usize,
    /// Number of providers that returned offers.
    pub providers_succeeded: usize,
    /// Number of providers that failed.
    pub providers_failed: usize,
    /// Wall-clock time spent on the search.
    pub search_time_ms: u64,
    /// Whether the offers came from the cache.
    pub cache_hit: bool,
}

impl Metadata {
    /// Creates metadata from a fan-out outcome.
    #[must_use]
    pub fn from_fan_out(queried: usize, failed: usize) -> Self {
        Self {
            providers_queried: queried,
            providers_succeeded: queried.saturating_sub(failed),
            providers_failed: failed,
            ..Self::default()
        }
    }

    /// Returns a copy with the per-response fields replaced.
    #[must_use]
    pub fn for_response(mut self, total_results: usize, search_time_ms: u64, cache_hit: bool) -> Self {
        self.total_results = total_results;
        self.search_time_ms = search_time_ms;
        self.cache_hit = cache_hit;
        self
    }

    /// Returns true if at least one provider failed.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.providers_failed > 0
    }
}
