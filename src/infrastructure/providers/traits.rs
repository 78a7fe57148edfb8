//! # Provider Traits
//!
//! Port definitions for flight providers.
//!
//! A [`FlightSource`] performs one raw fetch and maps the upstream schema
//! into canonical [`Flight`] records. A [`FlightProvider`] is what the
//! aggregation engine calls; production providers are sources wrapped in
//! the resilience envelope of
//! [`ResilientProvider`](crate::infrastructure::providers::resilient::ResilientProvider).

use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::SearchCriteria;
use crate::infrastructure::providers::error::ProviderResult;
use async_trait::async_trait;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// A named flight provider the aggregation engine can search.
#[async_trait]
pub trait FlightProvider: Send + Sync + fmt::Debug {
    /// Returns the provider name used in the registry, logs and rate limit keys.
    fn name(&self) -> &str;

    /// Searches the provider for offers matching the criteria.
    ///
    /// # Errors
    ///
    /// Returns a `ProviderError` describing why no offers could be obtained.
    /// Implementations return `ProviderError::Cancelled` once `cancel` fires.
    async fn search(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> ProviderResult<Vec<Flight>>;
}

/// A single raw fetch against an upstream, including schema mapping.
#[async_trait]
pub trait FlightSource: Send + Sync + fmt::Debug {
    /// Fetches offers once, without retries or rate limiting.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Transient` for failures worth retrying and
    /// `ProviderError::Upstream` for everything else.
    async fn fetch(&self, criteria: &SearchCriteria) -> ProviderResult<Vec<Flight>>;
}
