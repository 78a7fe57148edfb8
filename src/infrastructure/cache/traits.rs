//! # Cache Traits
//!
//! Ports for the shared flight cache.
//!
//! [`KeyValueStore`] is the four-primitive backend contract. [`FlightCacher`]
//! is what the aggregation engine talks to: key derivation, typed reads and
//! writes of offers and metadata, and the advisory write lock.

use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::{Metadata, SearchCriteria};
use crate::infrastructure::cache::error::CacheResult;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Minimal key/value backend. Each call is one round trip.
#[async_trait]
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Sets `key` to `value` with a TTL only if the key is absent.
    ///
    /// Returns true if the value was written.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the store fails.
    async fn set_nx_px(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool>;

    /// Sets `key` to `value` with a TTL, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the store fails.
    async fn set_px(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Returns the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the store fails.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Deletes `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the store fails.
    async fn del(&self, key: &str) -> CacheResult<()>;
}

/// Typed access to cached search results and the write lock.
#[async_trait]
pub trait FlightCacher: Send + Sync + fmt::Debug {
    /// Returns the cache key for the criteria identity.
    fn cache_key(&self, criteria: &SearchCriteria) -> String;

    /// Returns the lock key for the criteria identity.
    fn lock_key(&self, criteria: &SearchCriteria) -> String;

    /// Reads cached offers.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Miss` if nothing is cached, which is distinct
    /// from a cached empty list.
    async fn get_flights(&self, key: &str) -> CacheResult<Vec<Flight>>;

    /// Reads cached metadata.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Miss` if nothing is cached.
    async fn get_metadata(&self, key: &str) -> CacheResult<Metadata>;

    /// Tries to take the write lock for `ttl`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the store fails.
    async fn acquire_lock(&self, key: &str, ttl: Duration) -> CacheResult<bool>;

    /// Releases the write lock unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Backend` if the store fails.
    async fn release_lock(&self, key: &str) -> CacheResult<()>;

    /// Writes offers, then metadata, both with `ttl`.
    ///
    /// A metadata failure is returned without rolling back the offers.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Serialization` or `CacheError::Backend`.
    async fn set_flights(
        &self,
        key: &str,
        flights: &[Flight],
        metadata: &Metadata,
        ttl: Duration,
    ) -> CacheResult<()>;
}
