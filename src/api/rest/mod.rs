//! # REST API
//!
//! REST endpoints using axum.
//!
//! # Endpoints
//!
//! ## Flights
//! - `POST /api/v1/flights/search` - Search every provider through the cache
//! - `POST /api/v1/providers/{name}/search` - Search one provider directly
//!
//! ## Health
//! - `GET /api/v1/health` - Health check endpoint
//!
//! Errors are returned as `{"error": "..."}` with the status of the
//! underlying [`AggregationError`](crate::application::error::AggregationError).
//!
//! # Usage
//!
//! ```ignore
//! use flight_aggregator::api::rest::{create_router, AppState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState::new(engine, shutdown.clone()));
//! let router = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{AppState, HealthResponse};
pub use routes::create_router;
