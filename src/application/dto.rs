//! # Data Transfer Objects
//!
//! Response shapes of the aggregation use case.

use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::{Metadata, SearchCriteria};
use serde::{Deserialize, Serialize};

/// Result of a flight search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFlightResponse {
    /// Criteria as received.
    pub search_criteria: SearchCriteria,
    /// Provider and cache statistics.
    pub metadata: Metadata,
    /// Filtered, ranked and sorted offers.
    pub flights: Vec<Flight>,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

impl ErrorResponse {
    /// Creates an error body.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
