//! # Flight Sources
//!
//! Generic sources that serve offers already in the canonical schema.
//!
//! - [`HttpFlightSource`]: posts the criteria to an HTTP endpoint
//! - [`FileFlightSource`]: reads a JSON document from disk, used for local
//!   runs and fixtures
//!
//! Both expect a [`FlightFeed`] document and keep only offers that match the
//! identity fields of the criteria (see [`retain_matching`]).

use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::SearchCriteria;
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::http_client::HttpClient;
use crate::infrastructure::providers::traits::FlightSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document returned by canonical sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightFeed {
    /// Offers in canonical form.
    #[serde(default)]
    pub flights: Vec<Flight>,
}

/// Keeps offers that serve the requested route, date, cabin and party size.
///
/// Upstreams tend to return more than was asked for, so this runs on every
/// fetched batch before it reaches the aggregation engine.
#[must_use]
pub fn retain_matching(flights: Vec<Flight>, criteria: &SearchCriteria) -> Vec<Flight> {
    flights
        .into_iter()
        .filter(|flight| matches_criteria(flight, criteria))
        .collect()
}

fn matches_criteria(flight: &Flight, criteria: &SearchCriteria) -> bool {
    if !criteria.origin.is_empty() && flight.departure.airport != criteria.origin {
        return false;
    }
    if !criteria.destination.is_empty() && flight.arrival.airport != criteria.destination {
        return false;
    }
    if !criteria.departure_date.is_empty() {
        // Date as seen at the departure airport.
        let departs_on = chrono::DateTime::parse_from_rfc3339(&flight.departure.datetime)
            .map(|at| at.date_naive().format("%Y-%m-%d").to_string());
        if departs_on.as_deref() != Ok(criteria.departure_date.as_str()) {
            return false;
        }
    }
    if !criteria.cabin_class.is_empty()
        && !flight.cabin_class.eq_ignore_ascii_case(&criteria.cabin_class)
    {
        return false;
    }
    flight.available_seats >= criteria.passengers
}

/// Source that posts the criteria to an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpFlightSource {
    endpoint: String,
    client: HttpClient,
}

impl HttpFlightSource {
    /// Creates a source for `endpoint` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Upstream` if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, request_timeout_ms: u64) -> ProviderResult<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            client: HttpClient::new(request_timeout_ms)?,
        })
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FlightSource for HttpFlightSource {
    async fn fetch(&self, criteria: &SearchCriteria) -> ProviderResult<Vec<Flight>> {
        let feed: FlightFeed = self.client.post(&self.endpoint, criteria).await?;
        Ok(retain_matching(feed.flights, criteria))
    }
}

/// Source that reads a JSON document from disk on every fetch.
#[derive(Debug, Clone)]
pub struct FileFlightSource {
    path: PathBuf,
}

impl FileFlightSource {
    /// Creates a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FlightSource for FileFlightSource {
    async fn fetch(&self, criteria: &SearchCriteria) -> ProviderResult<Vec<Flight>> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            ProviderError::upstream(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let feed: FlightFeed = serde_json::from_slice(&raw).map_err(|e| {
            ProviderError::upstream(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(retain_matching(feed.flights, criteria))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::flight::fixtures::flight;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn criteria() -> SearchCriteria {
        SearchCriteria::new("CGK", "DPS", "2025-12-15", 2, "economy")
    }

    #[test]
    fn retain_matching_checks_identity_fields() {
        let matching = flight("ok", 1_000_000, 110, 0, 0);

        let mut wrong_origin = flight("origin", 1_000_000, 110, 0, 0);
        wrong_origin.departure.airport = "SUB".to_string();

        let mut wrong_cabin = flight("cabin", 1_000_000, 110, 0, 0);
        wrong_cabin.cabin_class = "business".to_string();

        let mut sold_out = flight("seats", 1_000_000, 110, 0, 0);
        sold_out.available_seats = 1;

        let mut other_day = flight("date", 1_000_000, 110, 0, 0);
        other_day.departure.datetime = "2025-12-16T06:00:00+07:00".to_string();

        let kept = retain_matching(
            vec![matching, wrong_origin, wrong_cabin, sold_out, other_day],
            &criteria(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "ok");
    }

    #[test]
    fn retain_matching_uses_local_departure_date() {
        // 23:30 UTC on the 14th is already the 15th in Jakarta.
        let mut late = flight("late", 1_000_000, 110, 0, 0);
        late.departure.datetime = "2025-12-15T06:30:00+07:00".to_string();
        assert_eq!(retain_matching(vec![late], &criteria()).len(), 1);
    }

    #[test]
    fn cabin_match_is_case_insensitive() {
        let mut upper = flight("upper", 1_000_000, 110, 0, 0);
        upper.cabin_class = "ECONOMY".to_string();
        assert_eq!(retain_matching(vec![upper], &criteria()).len(), 1);
    }

    #[tokio::test]
    async fn file_source_reads_feed() {
        let feed = FlightFeed {
            flights: vec![flight("a", 1_000_000, 110, 0, 2), flight("b", 900_000, 95, 1, 0)],
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&serde_json::to_vec(&feed).unwrap()).unwrap();

        let source = FileFlightSource::new(file.path());
        let flights = source.fetch(&criteria()).await.unwrap();
        assert_eq!(flights.len(), 2);
    }

    #[tokio::test]
    async fn file_source_missing_file_is_upstream_error() {
        let source = FileFlightSource::new("/nonexistent/flights.json");
        let error = source.fetch(&criteria()).await.unwrap_err();
        assert!(!error.is_transient());
        assert!(error.to_string().contains("failed to read"));
    }

    #[tokio::test]
    async fn file_source_bad_json_is_upstream_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();

        let error = FileFlightSource::new(file.path())
            .fetch(&criteria())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("failed to parse"));
    }

    #[tokio::test]
    async fn http_source_posts_criteria() {
        let server = MockServer::start().await;
        let feed = FlightFeed {
            flights: vec![flight("a", 1_000_000, 110, 0, 2)],
        };
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&feed))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpFlightSource::new(format!("{}/search", server.uri()), 1000).unwrap();
        let flights = source.fetch(&criteria()).await.unwrap();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].id, "a");
    }

    #[tokio::test]
    async fn http_source_server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let source = HttpFlightSource::new(server.uri(), 1000).unwrap();
        let error = source.fetch(&criteria()).await.unwrap_err();
        assert!(error.is_transient());
    }

    #[tokio::test]
    async fn http_source_throttled_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let source = HttpFlightSource::new(server.uri(), 1000).unwrap();
        let error = source.fetch(&criteria()).await.unwrap_err();
        assert!(error.is_rate_limited());
    }
}
