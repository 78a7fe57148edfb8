//! # Application Errors
//!
//! Caller-visible errors of the aggregation use case.
//!
//! Provider and cache failures are absorbed inside the engine. What reaches
//! the caller is either bad input, an empty result, throttling, or an
//! internal failure, each with an HTTP status classification.
//!
//! # Error Hierarchy
//!
//! ```text
//! AggregationError
//! ├── Validation(String)           - 400, malformed criteria
//! ├── NoFlightsFound { metadata }  - 404, nothing left after merge and filter
//! ├── RateLimited(String)          - 429, provider throttling
//! └── Internal(String)             - 500, everything else
//! ```
//!
//! # Examples
//!
//! ```
//! use flight_aggregator::application::error::AggregationError;
//! use axum::http::StatusCode;
//!
//! let err = AggregationError::validation("origin is required");
//! assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
//! assert_eq!(err.to_string(), "origin is required");
//! ```

use crate::domain::errors::DomainError;
use crate::domain::value_objects::Metadata;
use crate::infrastructure::providers::error::ProviderError;
use axum::http::StatusCode;
use thiserror::Error;

/// Error type for flight aggregation.
#[derive(Debug, Clone, Error)]
pub enum AggregationError {
    /// The search criteria are invalid.
    #[error("{0}")]
    Validation(String),

    /// No offer survived merging and filtering.
    #[error("no flights found")]
    NoFlightsFound {
        /// Provider statistics of the failed search.
        metadata: Metadata,
    },

    /// A provider throttled the request.
    #[error("provider rate limit exceeded: {0}")]
    RateLimited(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AggregationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a no flights found error.
    #[must_use]
    pub fn no_flights_found(metadata: Metadata) -> Self {
        Self::NoFlightsFound { metadata }
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NoFlightsFound { .. } => StatusCode::NOT_FOUND,
            Self::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if this is a no flights found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoFlightsFound { .. })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the metadata carried by a no flights found error.
    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        match self {
            Self::NoFlightsFound { metadata } => Some(metadata),
            _ => None,
        }
    }
}

impl From<DomainError> for AggregationError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Validation(message) => Self::Validation(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ProviderError> for AggregationError {
    fn from(error: ProviderError) -> Self {
        if error.is_rate_limited() {
            Self::RateLimited(error.to_string())
        } else {
            Self::Internal(error.to_string())
        }
    }
}

/// Result type for aggregation operations.
pub type AggregationResult<T> = Result<T, AggregationError>;
