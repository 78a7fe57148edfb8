//! # Flight Filter
//!
//! Applies the caller's [`FilterOption`] bounds to a list of offers.
//!
//! Every set bound must hold for an offer to be kept. Time-of-day windows
//! compare hours in the offer's own UTC offset, inclusive on both ends, and
//! only apply when both start and end are given. An offer whose window or
//! timestamp cannot be parsed is dropped and logged.

use crate::domain::entities::flight::Flight;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::FilterOption;
use chrono::{DateTime, NaiveTime, Timelike};
use tracing::warn;

/// Returns the offers that satisfy every bound in `filter`.
///
/// `None` keeps every offer.
#[must_use]
pub fn filter_flights(flights: Vec<Flight>, filter: Option<&FilterOption>) -> Vec<Flight> {
    let Some(filter) = filter else {
        return flights;
    };
    flights
        .into_iter()
        .filter(|flight| matches_filter(flight, filter))
        .collect()
}

fn matches_filter(flight: &Flight, filter: &FilterOption) -> bool {
    if let Some(airline) = &filter.airline
        && *airline != flight.airline.code
    {
        return false;
    }
    if filter.max_price.is_some_and(|max| flight.price.amount > max) {
        return false;
    }
    if filter.min_price.is_some_and(|min| flight.price.amount < min) {
        return false;
    }
    if filter.max_stops.is_some_and(|max| flight.stops > max) {
        return false;
    }
    if filter.min_stops.is_some_and(|min| flight.stops < min) {
        return false;
    }
    let minutes = flight.duration.total_minutes;
    if filter.max_duration_minutes.is_some_and(|max| minutes > max) {
        return false;
    }
    if filter.min_duration_minutes.is_some_and(|min| minutes < min) {
        return false;
    }
    if let (Some(start), Some(end)) = (&filter.departure_time_start, &filter.departure_time_end)
        && !within_window(flight, &flight.departure.datetime, start, end)
    {
        return false;
    }
    if let (Some(start), Some(end)) = (&filter.arrival_time_start, &filter.arrival_time_end)
        && !within_window(flight, &flight.arrival.datetime, start, end)
    {
        return false;
    }
    true
}

fn within_window(flight: &Flight, datetime: &str, start: &str, end: &str) -> bool {
    match hour_in_window(datetime, start, end) {
        Ok(inside) => inside,
        Err(e) => {
            warn!(flight_id = %flight.id, error = %e, "excluding offer from time window filter");
            false
        }
    }
}

/// Returns whether the local hour of `datetime` lies in `[start, end]` by hour.
///
/// # Errors
///
/// Returns `DomainError::InvalidDatetime` for a malformed RFC 3339 value and
/// `DomainError::InvalidTimeOfDay` for a bound that is not `HH:MM`.
pub fn hour_in_window(datetime: &str, start: &str, end: &str) -> DomainResult<bool> {
    let at = DateTime::parse_from_rfc3339(datetime)
        .map_err(|e| DomainError::InvalidDatetime(format!("{datetime}: {e}")))?;
    let start = parse_time_of_day(start)?;
    let end = parse_time_of_day(end)?;

    let hour = at.hour();
    Ok(hour >= start.hour() && hour <= end.hour())
}

fn parse_time_of_day(value: &str) -> DomainResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|e| DomainError::InvalidTimeOfDay(format!("{value}: {e}")))
}
