//! # Search Criteria
//!
//! The immutable query a caller submits, plus its optional filter and sort
//! options.
//!
//! Only the identity fields (origin, destination, departure date, cabin
//! class, passengers) take part in cache and lock keys; filter and sort
//! options are applied after retrieval.
//!
//! # Examples
//!
//! ```
//! use flight_aggregator::domain::value_objects::search_criteria::SearchCriteria;
//!
//! let criteria = SearchCriteria::new("CGK", "DPS", "2025-12-15", 1, "economy");
//! assert!(criteria.validate().is_ok());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on passengers per search.
pub const MAX_PASSENGERS: u32 = 10;

/// Cabin classes accepted in a search.
pub const ALLOWED_CABIN_CLASSES: [&str; 3] = ["economy", "business", "first"];

/// A flight search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Origin airport code.
    pub origin: String,
    /// Destination airport code.
    pub destination: String,
    /// Departure date, `YYYY-MM-DD`.
    pub departure_date: String,
    /// Number of passengers.
    pub passengers: u32,
    /// Cabin class.
    pub cabin_class: String,
    /// Optional post-retrieval filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_option: Option<FilterOption>,
    /// Optional ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_option: Option<SortOption>,
}

impl SearchCriteria {
    /// Creates criteria with no filter and no sort option.
    #[must_use]
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        departure_date: impl Into<String>,
        passengers: u32,
        cabin_class: impl Into<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            departure_date: departure_date.into(),
            passengers,
            cabin_class: cabin_class.into(),
            filter_option: None,
            sort_option: None,
        }
    }

    /// Sets the filter option.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterOption) -> Self {
        self.filter_option = Some(filter);
        self
    }

    /// Sets the sort option.
    #[must_use]
    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort_option = Some(sort);
        self
    }

    /// Returns the identity fields joined in a fixed order.
    ///
    /// Cache and lock keys are built from this value, so two criteria that
    /// differ only in filter or sort options share the same identity. Cabin
    /// class is accepted in any case and folded to lower case here.
    #[must_use]
    pub fn identity(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.departure_date,
            self.origin,
            self.destination,
            self.cabin_class.to_ascii_lowercase(),
            self.passengers
        )
    }

    /// Validates the request fields.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` describing the first invalid field.
    pub fn validate(&self) -> DomainResult<()> {
        require("origin", &self.origin)?;
        require("destination", &self.destination)?;
        require("departure_date", &self.departure_date)?;
        require("cabin_class", &self.cabin_class)?;

        if chrono::NaiveDate::parse_from_str(&self.departure_date, "%Y-%m-%d").is_err() {
            return Err(DomainError::validation(
                "departure_date must be formatted as YYYY-MM-DD",
            ));
        }

        if self.passengers == 0 || self.passengers > MAX_PASSENGERS {
            return Err(DomainError::validation(format!(
                "passengers must be between 1 and {MAX_PASSENGERS}"
            )));
        }

        if !ALLOWED_CABIN_CLASSES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&self.cabin_class))
        {
            return Err(DomainError::validation(format!(
                "cabin_class must be one of [{}]",
                ALLOWED_CABIN_CLASSES.join(" ")
            )));
        }

        if let Some(sort) = &self.sort_option
            && SortField::parse(&sort.field).is_none()
        {
            return Err(DomainError::validation(format!(
                "Invalid sort field {}",
                sort.field
            )));
        }

        if let Some(filter) = &self.filter_option {
            filter.validate()?;
        }

        Ok(())
    }
}

impl fmt::Display for SearchCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}->{} on {} ({} x{})",
            self.origin, self.destination, self.departure_date, self.cabin_class, self.passengers
        )
    }
}

fn require(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!(
            "{field} is a required field"
        )));
    }
    Ok(())
}

/// Optional bounds applied to offers after retrieval.
///
/// Every field is independently optional; a time-of-day window is applied
/// only when both its start and end are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Minimum price, inclusive.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub min_price: Option<Decimal>,
    /// Maximum price, inclusive.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub max_price: Option<Decimal>,
    /// Minimum number of stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stops: Option<u32>,
    /// Maximum number of stops.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stops: Option<u32>,
    /// Airline code to keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline: Option<String>,
    /// Earliest departure time of day, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time_start: Option<String>,
    /// Latest departure time of day, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time_end: Option<String>,
    /// Earliest arrival time of day, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time_start: Option<String>,
    /// Latest arrival time of day, `HH:MM`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time_end: Option<String>,
    /// Minimum duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_minutes: Option<u32>,
    /// Maximum duration in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_duration_minutes: Option<u32>,
}

impl FilterOption {
    /// Checks that paired bounds are ordered.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` when a max bound is not greater
    /// than its min bound, or a price bound is not positive.
    pub fn validate(&self) -> DomainResult<()> {
        for (name, bound) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(value) = bound
                && value <= Decimal::ZERO
            {
                return Err(DomainError::validation(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && max <= min
        {
            return Err(DomainError::validation(
                "max_price must be greater than min_price",
            ));
        }

        if let (Some(min), Some(max)) = (self.min_stops, self.max_stops)
            && max <= min
        {
            return Err(DomainError::validation(
                "max_stops must be greater than min_stops",
            ));
        }

        if let (Some(min), Some(max)) = (self.min_duration_minutes, self.max_duration_minutes)
            && max <= min
        {
            return Err(DomainError::validation(
                "max_duration_minutes must be greater than min_duration_minutes",
            ));
        }

        Ok(())
    }
}

/// Requested ordering of the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOption {
    /// Field name, see [`SortField`].
    pub field: String,
    /// `asc` or `desc`; anything other than `asc` sorts descending.
    #[serde(default)]
    pub order: String,
}

impl SortOption {
    /// Creates a sort option.
    #[must_use]
    pub fn new(field: impl Into<String>, order: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: order.into(),
        }
    }

    /// Returns true only for the literal `asc`.
    #[must_use]
    pub fn is_ascending(&self) -> bool {
        self.order == "asc"
    }
}

/// Fields offers can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    /// Price amount.
    Price,
    /// Total minutes.
    Duration,
    /// Stop count.
    Stops,
    /// Departure epoch seconds.
    DepartureTime,
    /// Arrival epoch seconds.
    ArrivalTime,
    /// Ranking score.
    Score,
}

impl SortField {
    /// Parses a field name accepted by the API.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "price" => Some(Self::Price),
            "duration" => Some(Self::Duration),
            "stops" => Some(Self::Stops),
            "departure_time" => Some(Self::DepartureTime),
            "arrival_time" => Some(Self::ArrivalTime),
            "score" | "best" => Some(Self::Score),
            _ => None,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Price => write!(f, "price"),
            Self::Duration => write!(f, "duration"),
            Self::Stops => write!(f, "stops"),
            Self::DepartureTime => write!(f, "departure_time"),
            Self::ArrivalTime => write!(f, "arrival_time"),
            Self::Score => write!(f, "score"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> SearchCriteria {
        SearchCriteria::new("CGK", "DPS", "2025-12-15", 1, "economy")
    }

    fn message(criteria: &SearchCriteria) -> String {
        criteria.validate().unwrap_err().to_string()
    }

    #[test]
    fn valid_criteria_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn cabin_class_is_case_insensitive() {
        let mut criteria = valid();
        criteria.cabin_class = "ECONOMY".to_string();
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn missing_origin() {
        let mut criteria = valid();
        criteria.origin = String::new();
        assert!(message(&criteria).contains("origin is a required field"));
    }

    #[test]
    fn bad_departure_date() {
        let mut criteria = valid();
        criteria.departure_date = "15/12/2025".to_string();
        assert!(message(&criteria).contains("YYYY-MM-DD"));
    }

    #[test]
    fn passengers_out_of_range() {
        let mut criteria = valid();
        criteria.passengers = 0;
        assert!(criteria.validate().is_err());
        criteria.passengers = 11;
        assert!(criteria.validate().is_err());
        criteria.passengers = 10;
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn unknown_cabin_class() {
        let mut criteria = valid();
        criteria.cabin_class = "premium".to_string();
        assert!(message(&criteria).contains("cabin_class"));
    }

    #[test]
    fn invalid_sort_field() {
        let criteria = valid().with_sort(SortOption::new("invalid", "asc"));
        assert!(message(&criteria).contains("Invalid sort field invalid"));
    }

    #[test]
    fn invalid_price_range() {
        let criteria = valid().with_filter(FilterOption {
            min_price: Some(Decimal::from(1000)),
            max_price: Some(Decimal::from(500)),
            ..Default::default()
        });
        assert!(message(&criteria).contains("max_price must be greater than min_price"));
    }

    #[test]
    fn invalid_stops_range() {
        let criteria = valid().with_filter(FilterOption {
            min_stops: Some(2),
            max_stops: Some(1),
            ..Default::default()
        });
        assert!(message(&criteria).contains("max_stops must be greater than min_stops"));
    }

    #[test]
    fn invalid_duration_range() {
        let criteria = valid().with_filter(FilterOption {
            min_duration_minutes: Some(200),
            max_duration_minutes: Some(100),
            ..Default::default()
        });
        assert!(message(&criteria).contains("max_duration_minutes"));
    }

    #[test]
    fn identity_ignores_filter_and_sort() {
        let plain = valid();
        let decorated = valid()
            .with_sort(SortOption::new("price", "asc"))
            .with_filter(FilterOption {
                max_stops: Some(1),
                ..Default::default()
            });
        assert_eq!(plain.identity(), decorated.identity());
        assert_eq!(plain.identity(), "2025-12-15:CGK:DPS:economy:1");
    }

    #[test]
    fn identity_folds_cabin_class_case() {
        let upper = SearchCriteria::new("CGK", "DPS", "2025-12-15", 1, "ECONOMY");
        assert!(upper.validate().is_ok());
        assert_eq!(upper.identity(), valid().identity());
    }

    #[test]
    fn sort_option_direction() {
        assert!(SortOption::new("price", "asc").is_ascending());
        assert!(!SortOption::new("price", "desc").is_ascending());
        assert!(!SortOption::new("price", "ASC").is_ascending());
        assert!(!SortOption::new("price", "").is_ascending());
    }

    #[test]
    fn sort_field_parse_round_trip() {
        for name in ["price", "duration", "stops", "departure_time", "arrival_time"] {
            assert_eq!(SortField::parse(name).unwrap().to_string(), name);
        }
        assert!(SortField::parse("cheapest").is_none());
    }

    #[test]
    fn deserialize_request_body() {
        let criteria: SearchCriteria = serde_json::from_value(serde_json::json!({
            "origin": "CGK",
            "destination": "DPS",
            "departure_date": "2025-12-15",
            "passengers": 2,
            "cabin_class": "economy",
            "filter_option": {"max_price": 2000000, "airline": "GA"},
            "sort_option": {"field": "price", "order": "asc"}
        }))
        .unwrap();

        let filter = criteria.filter_option.as_ref().unwrap();
        assert_eq!(filter.max_price, Some(Decimal::from(2_000_000)));
        assert_eq!(filter.airline.as_deref(), Some("GA"));
        assert!(criteria.sort_option.as_ref().unwrap().is_ascending());
    }
}
