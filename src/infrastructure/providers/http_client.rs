//! # HTTP Client Utilities
//!
//! Shared HTTP client for providers that speak JSON over HTTP.
//!
//! Errors are classified for the resilience envelope: connection failures,
//! per-request timeouts and 5xx responses are transient; 429 is a terminal
//! rate limit; anything else is an upstream error.

use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client wrapper for providers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout_ms: u64,
}

impl HttpClient {
    /// Creates a new HTTP client with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Upstream` if the client cannot be created.
    pub fn new(timeout_ms: u64) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ProviderError::upstream(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, timeout_ms })
    }

    /// Returns the per-request timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Posts a JSON body and deserializes the JSON response.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Transient` for connection failures, timeouts
    /// and server errors, `ProviderError::RateLimited` for 429 responses and
    /// `ProviderError::Upstream` otherwise.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> ProviderResult<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        handle_response(response).await
    }
}

async fn handle_response<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    let status = response.status();

    if status.is_success() {
        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::upstream(format!("failed to parse response: {e}")))
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, &body))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::transient("request timed out")
    } else if error.is_connect() {
        ProviderError::transient(format!("connection failed: {error}"))
    } else {
        ProviderError::upstream(format!("HTTP request failed: {error}"))
    }
}

fn map_status_error(status: StatusCode, body: &str) -> ProviderError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            ProviderError::rate_limited(format!("upstream throttled the request: {body}"))
        }
        s if s.is_server_error() => ProviderError::transient(format!("server error ({s}): {body}")),
        s => ProviderError::upstream(format!("HTTP error ({s}): {body}")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_client() {
        let client = HttpClient::new(5000).unwrap();
        assert_eq!(client.timeout_ms(), 5000);
    }

    #[test]
    fn status_classification() {
        assert!(map_status_error(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(map_status_error(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(map_status_error(StatusCode::TOO_MANY_REQUESTS, "").is_rate_limited());

        let error = map_status_error(StatusCode::BAD_REQUEST, "missing origin");
        assert!(!error.is_transient());
        assert!(error.to_string().contains("missing origin"));
    }
}
