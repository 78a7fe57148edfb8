//! # Flight Sort
//!
//! Orders offers by the caller's [`SortOption`].
//!
//! Without an option offers are sorted by score, best first. An unknown
//! field falls back to score. Any order other than the literal `asc` sorts
//! descending. Ties keep no particular order.

use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::{SortField, SortOption};
use std::cmp::Ordering;

/// Sorts `flights` in place.
pub fn sort_flights(flights: &mut [Flight], sort: Option<&SortOption>) {
    let (field, ascending) = match sort {
        Some(option) => (
            SortField::parse(&option.field).unwrap_or(SortField::Score),
            option.is_ascending(),
        ),
        None => (SortField::Score, true),
    };

    flights.sort_unstable_by(|a, b| {
        let ordering = compare_by(field, a, b);
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}

fn compare_by(field: SortField, a: &Flight, b: &Flight) -> Ordering {
    match field {
        SortField::Price => a.price.amount.cmp(&b.price.amount),
        SortField::Duration => a.duration.total_minutes.cmp(&b.duration.total_minutes),
        SortField::Stops => a.stops.cmp(&b.stops),
        SortField::DepartureTime => a.departure.timestamp.cmp(&b.departure.timestamp),
        SortField::ArrivalTime => a.arrival.timestamp.cmp(&b.arrival.timestamp),
        SortField::Score => a.score.total_cmp(&b.score),
    }
}
