//! # REST Handlers
//!
//! Request handlers for the flight search endpoints.

use crate::application::dto::{ErrorResponse, SearchFlightResponse};
use crate::application::error::AggregationError;
use crate::application::services::FlightAggregationEngine;
use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::SearchCriteria;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

/// Shared state of the REST handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Aggregation engine.
    pub engine: Arc<FlightAggregationEngine>,
    /// Root token cancelled on shutdown. Each request searches under a child.
    pub shutdown: CancellationToken,
    /// Budget after which a request's provider calls are cancelled.
    pub request_timeout: Option<Duration>,
}

impl AppState {
    /// Creates the handler state without a request deadline.
    #[must_use]
    pub fn new(engine: Arc<FlightAggregationEngine>, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            shutdown,
            request_timeout: None,
        }
    }

    /// Sets the per-request deadline.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Returns a token scoped to one request.
    ///
    /// The token is cancelled on shutdown, when the deadline passes, or when
    /// the returned guard drops (handler finished or client went away).
    /// Providers that are still running at that point give up and count as
    /// failed, so the caller gets whatever arrived in time.
    fn request_scope(&self) -> (CancellationToken, DropGuard) {
        let cancel = self.shutdown.child_token();
        if let Some(timeout) = self.request_timeout {
            let deadline = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    () = deadline.cancelled() => {}
                    () = tokio::time::sleep(timeout) => {
                        debug!(timeout = ?timeout, "request deadline reached");
                        deadline.cancel();
                    }
                }
            });
        }
        let guard = cancel.clone().drop_guard();
        (cancel, guard)
    }
}

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers.
    pub status: String,
    /// Registered provider names.
    pub providers: Vec<String>,
}

/// Single provider search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSearchResponse {
    /// Provider that answered.
    pub provider: String,
    /// Filtered, ranked and sorted offers.
    pub flights: Vec<Flight>,
}

impl IntoResponse for AggregationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(error = %self, "search failed");
        } else {
            debug!(error = %self, status = status.as_u16(), "search rejected");
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

fn rejection_response(rejection: &JsonRejection) -> Response {
    debug!(error = %rejection.body_text(), "malformed request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(rejection.body_text())),
    )
        .into_response()
}

/// Searches every provider for the posted criteria.
pub async fn search_flights(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SearchCriteria>, JsonRejection>,
) -> Response {
    let Json(criteria) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(&rejection),
    };

    let (cancel, _guard) = state.request_scope();

    match state.engine.search(&criteria, &cancel).await {
        Ok(response) => (StatusCode::OK, Json::<SearchFlightResponse>(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Searches a single named provider, bypassing the cache.
pub async fn search_provider(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Result<Json<SearchCriteria>, JsonRejection>,
) -> Response {
    let Json(criteria) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(&rejection),
    };

    let (cancel, _guard) = state.request_scope();

    match state.engine.search_provider(&name, &criteria, &cancel).await {
        Ok(flights) => (
            StatusCode::OK,
            Json(ProviderSearchResponse {
                provider: name,
                flights,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Reports liveness and the registered providers.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        providers: state
            .engine
            .registry()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}
