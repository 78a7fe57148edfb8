//! End-to-end aggregation tests over the in-process cache.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use async_trait::async_trait;
use chrono::DateTime;
use flight_aggregator::application::services::FlightAggregationEngine;
use flight_aggregator::domain::entities::{
    Airline, Baggage, Flight, FlightDuration, FlightPoint, FlightPrice,
};
use flight_aggregator::domain::value_objects::{SearchCriteria, SortOption};
use flight_aggregator::infrastructure::cache::{FlightCache, FlightCacher, InMemoryStore};
use flight_aggregator::infrastructure::providers::{
    FileFlightSource, FlightFeed, FlightProvider, GovernorRateLimiter, ProviderError,
    ProviderPolicy, ProviderRegistry, ProviderResult, ResilientProvider,
};
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn offer(id: &str, provider: &str, destination: &str, price: i64, minutes: u32) -> Flight {
    let departure = DateTime::parse_from_rfc3339("2025-12-15T08:30:00+07:00").unwrap();
    let arrival = departure + chrono::Duration::minutes(i64::from(minutes));
    Flight {
        id: id.to_string(),
        provider: provider.to_string(),
        airline: Airline::new(provider, "XX"),
        flight_number: id.to_string(),
        departure: FlightPoint::new("CGK", "Jakarta", departure),
        arrival: FlightPoint::new(destination, "", arrival),
        duration: FlightDuration::from_minutes(minutes),
        stops: 0,
        price: FlightPrice::new(Decimal::from(price), "IDR"),
        available_seats: 5,
        cabin_class: "economy".to_string(),
        aircraft: Some("A320".to_string()),
        amenities: vec!["wifi".to_string()],
        baggage: Baggage::default(),
        score: 0.0,
    }
}

fn criteria() -> SearchCriteria {
    SearchCriteria::new("CGK", "DPS", "2025-12-15", 1, "economy")
}

#[derive(Debug)]
struct CountingProvider {
    name: String,
    result: ProviderResult<Vec<Flight>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn new(name: &str, result: ProviderResult<Vec<Flight>>) -> Self {
        Self {
            name: name.to_string(),
            result,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FlightProvider for CountingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        _criteria: &SearchCriteria,
        _cancel: &CancellationToken,
    ) -> ProviderResult<Vec<Flight>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.result.clone()
    }
}

struct Harness {
    engine: Arc<FlightAggregationEngine>,
    cache: Arc<FlightCache<InMemoryStore>>,
}

fn harness(providers: Vec<Arc<dyn FlightProvider>>) -> Harness {
    let registry = providers
        .into_iter()
        .fold(ProviderRegistry::new(), ProviderRegistry::with_provider);
    let cache = Arc::new(FlightCache::new(Arc::new(InMemoryStore::new())));
    let engine = FlightAggregationEngine::with_defaults(Arc::new(registry), cache.clone());
    Harness {
        engine: Arc::new(engine),
        cache,
    }
}

#[tokio::test]
async fn miss_then_hit_serves_the_cached_snapshot() {
    let garuda = Arc::new(CountingProvider::new(
        "Garuda",
        Ok(vec![
            offer("ga-1", "Garuda", "DPS", 1_500_000, 110),
            offer("ga-2", "Garuda", "DPS", 1_100_000, 115),
        ]),
    ));
    let lion = Arc::new(CountingProvider::new(
        "Lion",
        Ok(vec![offer("jt-1", "Lion", "DPS", 700_000, 120)]),
    ));
    let h = harness(vec![garuda.clone(), lion.clone()]);
    let cancel = CancellationToken::new();

    let first = h.engine.search(&criteria(), &cancel).await.unwrap();
    assert!(!first.metadata.cache_hit);
    assert_eq!(first.metadata.total_results, 3);
    assert_eq!(first.metadata.providers_queried, 2);
    assert_eq!(first.metadata.providers_succeeded, 2);

    let second = h.engine.search(&criteria(), &cancel).await.unwrap();
    assert!(second.metadata.cache_hit);
    assert_eq!(second.metadata.providers_succeeded, 2);
    assert_eq!(second.flights, first.flights);
    assert_eq!(garuda.calls(), 1);
    assert_eq!(lion.calls(), 1);

    let key = h.cache.cache_key(&criteria());
    assert_eq!(h.cache.get_flights(&key).await.unwrap().len(), 3);
}

#[tokio::test]
async fn filters_and_sort_apply_to_cached_offers() {
    let provider = Arc::new(CountingProvider::new(
        "Garuda",
        Ok(vec![
            offer("a", "Garuda", "DPS", 1_500_000, 110),
            offer("b", "Garuda", "DPS", 900_000, 150),
            offer("c", "Garuda", "DPS", 1_200_000, 95),
        ]),
    ));
    let h = harness(vec![provider.clone()]);
    let cancel = CancellationToken::new();

    h.engine.search(&criteria(), &cancel).await.unwrap();

    let sorted = criteria().with_sort(SortOption::new("price", "asc"));
    let response = h.engine.search(&sorted, &cancel).await.unwrap();
    let ids: Vec<_> = response.flights.iter().map(|f| f.id.as_str()).collect();
    assert!(response.metadata.cache_hit);
    assert_eq!(ids, vec!["b", "c", "a"]);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn concurrent_identical_misses_leave_one_consistent_snapshot() {
    let provider = Arc::new(
        CountingProvider::new(
            "Garuda",
            Ok(vec![
                offer("ga-1", "Garuda", "DPS", 1_500_000, 110),
                offer("ga-2", "Garuda", "DPS", 1_100_000, 115),
            ]),
        )
        .with_delay(Duration::from_millis(50)),
    );
    let h = harness(vec![provider.clone()]);

    let searches: Vec<_> = (0..5)
        .map(|_| {
            let engine = Arc::clone(&h.engine);
            tokio::spawn(async move {
                engine
                    .search(&criteria(), &CancellationToken::new())
                    .await
            })
        })
        .collect();

    for search in searches {
        let response = search.await.unwrap().unwrap();
        assert!(!response.metadata.cache_hit);
        assert_eq!(response.metadata.total_results, 2);
    }

    // Every miss fans out; there is no request coalescing.
    assert_eq!(provider.calls(), 5);

    let key = h.cache.cache_key(&criteria());
    let mut cached: Vec<_> = h
        .cache
        .get_flights(&key)
        .await
        .unwrap()
        .into_iter()
        .map(|f| f.id)
        .collect();
    cached.sort();
    assert_eq!(cached, vec!["ga-1", "ga-2"]);
    let metadata = h.cache.get_metadata(&key).await.unwrap();
    assert_eq!(metadata.providers_queried, 1);

    let lock_key = h.cache.lock_key(&criteria());
    assert!(!h.cache.store().contains(&lock_key));

    let after = h.engine.search(&criteria(), &CancellationToken::new()).await.unwrap();
    assert!(after.metadata.cache_hit);
    assert_eq!(provider.calls(), 5);
}

#[tokio::test]
async fn all_providers_failing_is_no_flights_found() {
    let h = harness(vec![
        Arc::new(CountingProvider::new(
            "Garuda",
            Err(ProviderError::timeout(2000)),
        )),
        Arc::new(CountingProvider::new(
            "Lion",
            Err(ProviderError::upstream("503 from upstream")),
        )),
    ]);

    let err = h
        .engine
        .search(&criteria(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    let metadata = err.metadata().unwrap();
    assert_eq!(metadata.providers_queried, 2);
    assert_eq!(metadata.providers_failed, 2);
    assert_eq!(metadata.providers_succeeded, 0);
    assert_eq!(metadata.total_results, 0);
}

#[tokio::test]
async fn partial_failure_still_answers() {
    let h = harness(vec![
        Arc::new(CountingProvider::new(
            "Garuda",
            Ok(vec![offer("ga-1", "Garuda", "DPS", 1_500_000, 110)]),
        )),
        Arc::new(CountingProvider::new(
            "Lion",
            Err(ProviderError::rate_limited("limit:Lion")),
        )),
    ]);

    let response = h
        .engine
        .search(&criteria(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(response.metadata.is_partial());
    assert_eq!(response.metadata.providers_failed, 1);
    assert_eq!(response.flights.len(), 1);
}

#[tokio::test]
async fn file_backed_provider_keeps_only_matching_offers() {
    let feed = FlightFeed {
        flights: vec![
            offer("to-bali", "AirAsia", "DPS", 650_000, 105),
            offer("to-surabaya", "AirAsia", "SUB", 450_000, 80),
        ],
    };
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&feed).unwrap().as_bytes())
        .unwrap();

    let provider = ResilientProvider::new(
        "AirAsia",
        Arc::new(FileFlightSource::new(file.path())),
        Arc::new(GovernorRateLimiter::new()),
    )
    .with_policy(ProviderPolicy::default().with_timeout(Duration::from_millis(500)));
    let h = harness(vec![Arc::new(provider)]);

    let response = h
        .engine
        .search(&criteria(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.flights.len(), 1);
    assert_eq!(response.flights[0].id, "to-bali");
    assert_eq!(response.metadata.providers_succeeded, 1);
}
