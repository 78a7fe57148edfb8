//! # REST Routes
//!
//! Router construction for the REST API.

use crate::api::rest::handlers::{self, AppState};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Builds the REST router with request tracing.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/flights/search", post(handlers::search_flights))
        .route(
            "/api/v1/providers/{name}/search",
            post(handlers::search_provider),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::application::services::FlightAggregationEngine;
    use crate::domain::entities::flight::Flight;
    use crate::domain::entities::flight::fixtures::flight;
    use crate::domain::value_objects::SearchCriteria;
    use crate::infrastructure::cache::{FlightCache, InMemoryStore};
    use crate::infrastructure::providers::{
        FlightProvider, ProviderError, ProviderRegistry, ProviderResult,
    };
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct StaticProvider {
        name: &'static str,
        result: ProviderResult<Vec<Flight>>,
    }

    #[async_trait]
    impl FlightProvider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn search(
            &self,
            _criteria: &SearchCriteria,
            _cancel: &CancellationToken,
        ) -> ProviderResult<Vec<Flight>> {
            self.result.clone()
        }
    }

    /// Never answers on its own; gives up once cancelled.
    #[derive(Debug)]
    struct HangingProvider;

    #[async_trait]
    impl FlightProvider for HangingProvider {
        fn name(&self) -> &str {
            "Hanging"
        }

        async fn search(
            &self,
            _criteria: &SearchCriteria,
            cancel: &CancellationToken,
        ) -> ProviderResult<Vec<Flight>> {
            cancel.cancelled().await;
            Err(ProviderError::Cancelled)
        }
    }

    fn engine(providers: Vec<Arc<dyn FlightProvider>>) -> Arc<FlightAggregationEngine> {
        let registry = providers
            .into_iter()
            .fold(ProviderRegistry::new(), ProviderRegistry::with_provider);
        let cache = Arc::new(FlightCache::new(Arc::new(InMemoryStore::new())));
        Arc::new(FlightAggregationEngine::with_defaults(
            Arc::new(registry),
            cache,
        ))
    }

    fn router(providers: Vec<StaticProvider>) -> Router {
        let providers = providers
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn FlightProvider>)
            .collect();
        create_router(Arc::new(AppState::new(
            engine(providers),
            CancellationToken::new(),
        )))
    }

    fn default_router() -> Router {
        router(vec![
            StaticProvider {
                name: "Garuda",
                result: Ok(vec![
                    flight("ga-1", 1_500_000, 110, 0, 3),
                    flight("ga-2", 900_000, 180, 1, 1),
                ]),
            },
            StaticProvider {
                name: "AirAsia",
                result: Err(ProviderError::rate_limited("limit:AirAsia")),
            },
        ])
    }

    fn search_body() -> Value {
        json!({
            "origin": "CGK",
            "destination": "DPS",
            "departure_date": "2025-12-15",
            "passengers": 1,
            "cabin_class": "economy"
        })
    }

    async fn post_json(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_lists_providers() {
        let response = default_router()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["providers"], json!(["AirAsia", "Garuda"]));
    }

    #[tokio::test]
    async fn search_returns_ranked_flights_with_metadata() {
        let (status, body) = post_json(
            default_router(),
            "/api/v1/flights/search",
            &search_body().to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["search_criteria"]["origin"], "CGK");
        assert_eq!(body["metadata"]["total_results"], 2);
        assert_eq!(body["metadata"]["providers_queried"], 2);
        assert_eq!(body["metadata"]["providers_succeeded"], 1);
        assert_eq!(body["metadata"]["providers_failed"], 1);
        assert_eq!(body["metadata"]["cache_hit"], false);
        assert_eq!(body["flights"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_search_is_a_cache_hit() {
        let router = default_router();
        let body = search_body().to_string();
        let (_, first) = post_json(router.clone(), "/api/v1/flights/search", &body).await;
        let (status, second) = post_json(router, "/api/v1/flights/search", &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["metadata"]["cache_hit"], false);
        assert_eq!(second["metadata"]["cache_hit"], true);
        assert_eq!(second["flights"], first["flights"]);
    }

    #[tokio::test]
    async fn invalid_criteria_is_bad_request() {
        let mut body = search_body();
        body["passengers"] = json!(0);
        let (status, body) =
            post_json(default_router(), "/api/v1/flights/search", &body.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("passengers"));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (status, body) =
            post_json(default_router(), "/api/v1/flights/search", "{\"origin\":").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn empty_result_is_not_found() {
        let mut body = search_body();
        body["filter_option"] = json!({ "max_price": 100.0 });
        let (status, body) =
            post_json(default_router(), "/api/v1/flights/search", &body.to_string()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "no flights found");
    }

    #[tokio::test]
    async fn provider_search_maps_throttling_to_429() {
        let (status, body) = post_json(
            default_router(),
            "/api/v1/providers/AirAsia/search",
            &search_body().to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert!(body["error"].as_str().unwrap().contains("limit:AirAsia"));
    }

    #[tokio::test]
    async fn provider_search_returns_that_providers_flights() {
        let (status, body) = post_json(
            default_router(),
            "/api/v1/providers/Garuda/search",
            &search_body().to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["provider"], "Garuda");
        assert_eq!(body["flights"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_provider_is_bad_request() {
        let (status, _) = post_json(
            default_router(),
            "/api/v1/providers/Nope/search",
            &search_body().to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn request_deadline_cancels_slow_providers() {
        let providers: Vec<Arc<dyn FlightProvider>> = vec![
            Arc::new(StaticProvider {
                name: "Garuda",
                result: Ok(vec![flight("ga-1", 1_500_000, 110, 0, 3)]),
            }),
            Arc::new(HangingProvider),
        ];
        let state = AppState::new(engine(providers), CancellationToken::new())
            .with_request_timeout(std::time::Duration::from_millis(50));

        let (status, body) = post_json(
            create_router(Arc::new(state)),
            "/api/v1/flights/search",
            &search_body().to_string(),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["providers_succeeded"], 1);
        assert_eq!(body["metadata"]["providers_failed"], 1);
    }
}
