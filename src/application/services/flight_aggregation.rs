//! # Flight Aggregation Engine
//!
//! Orchestrates cached flight search across every registered provider.
//!
//! A search first reads the shared cache. On a miss every provider is
//! called concurrently and the engine waits for all of them; failures are
//! counted, never fatal on their own. The merged offers are written to the
//! cache by whichever concurrent search wins the write lock. Cached or
//! fresh, offers then go through filter, rank and sort.
//!
//! Concurrent misses for the same criteria all fan out. The lock only keeps
//! them from writing the cache more than once.

use crate::application::dto::SearchFlightResponse;
use crate::application::error::{AggregationError, AggregationResult};
use crate::application::services::flight_filter::filter_flights;
use crate::application::services::flight_sort::sort_flights;
use crate::application::services::ranking_strategy::{RankingStrategy, WeightedScoreStrategy};
use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::{Metadata, SearchCriteria};
use crate::infrastructure::cache::error::CacheError;
use crate::infrastructure::cache::traits::FlightCacher;
use crate::infrastructure::providers::error::ProviderResult;
use crate::infrastructure::providers::registry::ProviderRegistry;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for flight aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorConfig {
    /// Lifetime of cached offers and metadata.
    pub cache_ttl: Duration,
    /// Safety bound on the cache write lock.
    pub lock_ttl: Duration,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            lock_ttl: Duration::from_secs(10),
        }
    }
}

impl AggregatorConfig {
    /// Sets the cache TTL.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the lock TTL.
    #[must_use]
    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }
}

/// Outcome of one provider task.
#[derive(Debug)]
struct ProviderOutcome {
    provider: String,
    result: ProviderResult<Vec<Flight>>,
}

/// Releases the cache write lock when dropped.
///
/// [`release`](Self::release) is the normal path. If the owning future is
/// dropped first, the release is spawned onto the runtime instead.
struct CacheLockGuard {
    cache: Arc<dyn FlightCacher>,
    key: Option<String>,
}

impl CacheLockGuard {
    fn new(cache: Arc<dyn FlightCacher>, key: &str) -> Self {
        Self {
            cache,
            key: Some(key.to_string()),
        }
    }

    async fn release(mut self) {
        if let Some(key) = self.key.take() {
            release_lock(self.cache.as_ref(), &key).await;
        }
    }
}

impl Drop for CacheLockGuard {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let cache = Arc::clone(&self.cache);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move { release_lock(cache.as_ref(), &key).await });
        }
    }
}

async fn release_lock(cache: &dyn FlightCacher, key: &str) {
    if let Err(e) = cache.release_lock(key).await {
        warn!(lock_key = %key, error = %e, "failed to release cache lock");
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn log_cache_read(what: &'static str, key: &str, error: &CacheError) {
    if error.is_miss() {
        debug!(cache_key = %key, what, "cache miss");
    } else {
        warn!(cache_key = %key, what, error = %error, "failed to read from cache");
    }
}

/// Engine for cached, concurrent flight search.
#[derive(Debug, Clone)]
pub struct FlightAggregationEngine {
    registry: Arc<ProviderRegistry>,
    cache: Arc<dyn FlightCacher>,
    ranking_strategy: Arc<dyn RankingStrategy>,
    config: AggregatorConfig,
}

impl FlightAggregationEngine {
    /// Creates a new engine.
    #[must_use]
    pub fn new(
        registry: Arc<ProviderRegistry>,
        cache: Arc<dyn FlightCacher>,
        ranking_strategy: Arc<dyn RankingStrategy>,
        config: AggregatorConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            ranking_strategy,
            config,
        }
    }

    /// Creates an engine with weighted ranking and default configuration.
    #[must_use]
    pub fn with_defaults(registry: Arc<ProviderRegistry>, cache: Arc<dyn FlightCacher>) -> Self {
        Self::new(
            registry,
            cache,
            Arc::new(WeightedScoreStrategy::default()),
            AggregatorConfig::default(),
        )
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Returns the provider registry.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Returns the ranking strategy name.
    #[must_use]
    pub fn ranking_strategy_name(&self) -> &'static str {
        self.ranking_strategy.name()
    }

    /// Searches every provider, through the shared cache.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `AggregationError::Validation` if the criteria are invalid
    /// - `AggregationError::NoFlightsFound` if no offer is left after
    ///   merging and filtering, carrying the provider statistics
    #[tracing::instrument(
        skip(self, criteria, cancel),
        fields(
            origin = %criteria.origin,
            destination = %criteria.destination,
            date = %criteria.departure_date,
        )
    )]
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> AggregationResult<SearchFlightResponse> {
        criteria.validate()?;

        let started = Instant::now();
        let cache_key = self.cache.cache_key(criteria);
        let lock_key = self.cache.lock_key(criteria);

        let (flights, metadata, cache_hit) = match self.read_cache(&cache_key).await {
            Some((flights, metadata)) => (flights, metadata, true),
            None => {
                let (flights, metadata) = self.collect_from_providers(criteria, cancel).await;
                self.populate_cache(&cache_key, &lock_key, &flights, &metadata)
                    .await;
                (flights, metadata, false)
            }
        };

        let mut flights = filter_flights(flights, criteria.filter_option.as_ref());
        self.ranking_strategy.rank(&mut flights);
        sort_flights(&mut flights, criteria.sort_option.as_ref());

        let metadata = metadata.for_response(flights.len(), elapsed_ms(started), cache_hit);
        if flights.is_empty() {
            info!(
                cache_hit,
                providers_failed = metadata.providers_failed,
                "no flights found"
            );
            return Err(AggregationError::no_flights_found(metadata));
        }

        info!(
            cache_hit,
            total_results = metadata.total_results,
            providers_failed = metadata.providers_failed,
            search_time_ms = metadata.search_time_ms,
            "search completed"
        );
        Ok(SearchFlightResponse {
            search_criteria: criteria.clone(),
            metadata,
            flights,
        })
    }

    /// Searches a single provider directly, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::Validation` for invalid criteria or an
    /// unknown provider, `AggregationError::RateLimited` if the provider is
    /// throttled and `AggregationError::Internal` for any other failure.
    pub async fn search_provider(
        &self,
        name: &str,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> AggregationResult<Vec<Flight>> {
        criteria.validate()?;
        let provider = self
            .registry
            .get(name)
            .ok_or_else(|| AggregationError::validation(format!("unknown provider: {name}")))?;

        let flights = provider.search(criteria, cancel).await?;
        let mut flights = filter_flights(flights, criteria.filter_option.as_ref());
        self.ranking_strategy.rank(&mut flights);
        sort_flights(&mut flights, criteria.sort_option.as_ref());
        Ok(flights)
    }

    /// Reads offers and metadata. Both must be present for a hit.
    async fn read_cache(&self, key: &str) -> Option<(Vec<Flight>, Metadata)> {
        let flights = self.cache.get_flights(key).await;
        let metadata = self.cache.get_metadata(key).await;
        match (flights, metadata) {
            (Ok(flights), Ok(metadata)) => Some((flights, metadata)),
            (flights, metadata) => {
                if let Err(e) = &flights {
                    log_cache_read("flights", key, e);
                }
                if let Err(e) = &metadata {
                    log_cache_read("metadata", key, e);
                }
                None
            }
        }
    }

    /// Calls every provider concurrently and waits for all of them.
    async fn collect_from_providers(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> (Vec<Flight>, Metadata) {
        let providers = self.registry.all();
        let queried = providers.len();

        let mut tasks: FuturesUnordered<_> = providers
            .into_iter()
            .map(|provider| {
                let criteria = criteria.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let result = provider.search(&criteria, &cancel).await;
                    ProviderOutcome {
                        provider: provider.name().to_string(),
                        result,
                    }
                })
            })
            .collect();

        let mut merged = Vec::new();
        let mut failed = 0;
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(ProviderOutcome {
                    provider,
                    result: Ok(flights),
                }) => {
                    debug!(provider = %provider, count = flights.len(), "provider returned offers");
                    merged.extend(flights);
                }
                Ok(ProviderOutcome {
                    provider,
                    result: Err(e),
                }) => {
                    warn!(provider = %provider, error = %e, "provider failed");
                    failed += 1;
                }
                Err(e) => {
                    warn!(error = %e, "provider task panicked");
                    failed += 1;
                }
            }
        }

        (merged, Metadata::from_fan_out(queried, failed))
    }

    /// Writes fresh results if this search wins the write lock.
    ///
    /// The lock is released afterwards whether or not it was acquired.
    /// Lock and write failures are logged and otherwise ignored.
    async fn populate_cache(
        &self,
        cache_key: &str,
        lock_key: &str,
        flights: &[Flight],
        metadata: &Metadata,
    ) {
        let guard = CacheLockGuard::new(Arc::clone(&self.cache), lock_key);

        let acquired = match self.cache.acquire_lock(lock_key, self.config.lock_ttl).await {
            Ok(acquired) => acquired,
            Err(e) => {
                warn!(lock_key = %lock_key, error = %e, "failed to acquire cache lock");
                false
            }
        };

        if acquired {
            match self
                .cache
                .set_flights(cache_key, flights, metadata, self.config.cache_ttl)
                .await
            {
                Ok(()) => debug!(cache_key = %cache_key, count = flights.len(), "cached flights"),
                Err(e) => warn!(cache_key = %cache_key, error = %e, "failed to write flights to cache"),
            }
        } else {
            debug!(lock_key = %lock_key, "cache lock held elsewhere, skipping write");
        }

        guard.release().await;
    }
}
