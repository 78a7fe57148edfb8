//! # Flight Aggregator
//!
//! Flight offer aggregation with a cached fan-out over many providers.
//!
//! A search is answered from the shared cache when possible. On a miss every
//! registered provider is queried concurrently, each call wrapped in a
//! timeout, a shared rate limit and retries with exponential backoff. The
//! merged offers are written back to the cache under a short-lived lock,
//! then filtered, scored and sorted for the caller. Provider failures are
//! reported in the response metadata instead of failing the search.
//!
//! # Layers
//!
//! - [`domain`]: flights, search criteria and response metadata
//! - [`application`]: the aggregation engine with filtering, ranking and sorting
//! - [`infrastructure`]: provider adapters, rate limiting and cache backends
//! - [`api`]: the axum HTTP surface
//!
//! # Example
//!
//! ```ignore
//! use flight_aggregator::application::services::FlightAggregationEngine;
//! use flight_aggregator::domain::value_objects::SearchCriteria;
//! use flight_aggregator::infrastructure::cache::{FlightCache, InMemoryStore};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let cache = Arc::new(FlightCache::new(Arc::new(InMemoryStore::new())));
//! let engine = FlightAggregationEngine::with_defaults(Arc::new(registry), cache);
//!
//! let criteria = SearchCriteria::new("CGK", "DPS", "2025-12-15", 1, "economy");
//! let response = engine.search(&criteria, &CancellationToken::new()).await?;
//! println!("{} offers", response.metadata.total_results);
//! ```

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
