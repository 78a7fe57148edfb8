//! # Flight Cache
//!
//! [`FlightCacher`] over any [`KeyValueStore`].
//!
//! Keys are derived from the identity fields of the criteria only, so every
//! filter and sort variant of a search shares one entry:
//!
//! - offers: `flight:cache:<date>:<origin>:<destination>:<cabin>:<passengers>`
//! - metadata: the offers key followed by `:metadata`
//! - write lock: `flight:lock:<date>:<origin>:<destination>:<cabin>:<passengers>`
//!
//! Offers are stored exactly as fetched; scores are recomputed on every read.

use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::{Metadata, SearchCriteria};
use crate::infrastructure::cache::error::{CacheError, CacheResult};
use crate::infrastructure::cache::traits::{FlightCacher, KeyValueStore};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const CACHE_PREFIX: &str = "flight:cache";
const LOCK_PREFIX: &str = "flight:lock";
const METADATA_SUFFIX: &str = ":metadata";
const LOCK_SENTINEL: &str = "1";

/// Shared cache of search results.
#[derive(Debug)]
pub struct FlightCache<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> Clone for FlightCache<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore + ?Sized> FlightCache<S> {
    /// Creates a cache over `store`.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn metadata_key(key: &str) -> String {
        format!("{key}{METADATA_SUFFIX}")
    }

    async fn read(&self, key: &str) -> CacheResult<String> {
        self.store
            .get(key)
            .await?
            .ok_or_else(|| CacheError::miss(key))
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> FlightCacher for FlightCache<S> {
    fn cache_key(&self, criteria: &SearchCriteria) -> String {
        format!("{CACHE_PREFIX}:{}", criteria.identity())
    }

    fn lock_key(&self, criteria: &SearchCriteria) -> String {
        format!("{LOCK_PREFIX}:{}", criteria.identity())
    }

    async fn get_flights(&self, key: &str) -> CacheResult<Vec<Flight>> {
        let raw = self.read(key).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn get_metadata(&self, key: &str) -> CacheResult<Metadata> {
        let raw = self.read(&Self::metadata_key(key)).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn acquire_lock(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        self.store.set_nx_px(key, LOCK_SENTINEL, ttl).await
    }

    async fn release_lock(&self, key: &str) -> CacheResult<()> {
        self.store.del(key).await
    }

    async fn set_flights(
        &self,
        key: &str,
        flights: &[Flight],
        metadata: &Metadata,
        ttl: Duration,
    ) -> CacheResult<()> {
        let offers = serde_json::to_string(flights)?;
        self.store.set_px(key, &offers, ttl).await?;

        let metadata = serde_json::to_string(metadata)?;
        self.store
            .set_px(&Self::metadata_key(key), &metadata, ttl)
            .await
    }
}
