//! # Ranking Strategy
//!
//! Strategies for scoring flight offers.
//!
//! This module provides the [`RankingStrategy`] trait and the
//! [`WeightedScoreStrategy`] used by the aggregation engine. Scores are
//! batch-relative: they are only comparable between offers ranked together.

use crate::domain::entities::flight::Flight;
use rust_decimal::prelude::ToPrimitive;
use std::fmt;

/// Trait for ranking strategies.
///
/// Implementations write a score onto every offer in place. Lower scores
/// are better.
pub trait RankingStrategy: Send + Sync + fmt::Debug {
    /// Scores the given offers.
    fn rank(&self, flights: &mut [Flight]);

    /// Returns the name of this ranking strategy.
    fn name(&self) -> &'static str;
}

/// Rescales `value` into `[0, 1]` relative to `min` and `max`.
///
/// A degenerate range (`max == min`) yields 0 for any value.
#[must_use]
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max == min {
        return 0.0;
    }
    (value - min) / (max - min)
}

#[derive(Debug, Clone, Copy)]
struct Range {
    min: f64,
    max: f64,
}

impl Range {
    fn of(values: impl Iterator<Item = f64>) -> Self {
        values.fold(
            Self {
                min: f64::INFINITY,
                max: f64::NEG_INFINITY,
            },
            |range, value| Self {
                min: range.min.min(value),
                max: range.max.max(value),
            },
        )
    }

    fn normalize(self, value: f64) -> f64 {
        normalize(value, self.min, self.max)
    }
}

fn price_of(flight: &Flight) -> f64 {
    flight.price.amount.to_f64().unwrap_or(0.0)
}

fn count_as_f64(count: usize) -> f64 {
    u32::try_from(count).map_or(f64::from(u32::MAX), f64::from)
}

/// Weighted multi-criteria score over min-max normalized metrics.
///
/// Price, duration and stops are better when lower. Amenity count is better
/// when higher, so its normalized value is inverted.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedScoreStrategy {
    /// Weight for the price amount.
    pub price_weight: f64,
    /// Weight for the total duration.
    pub duration_weight: f64,
    /// Weight for the stop count.
    pub stops_weight: f64,
    /// Weight for the amenity count.
    pub amenities_weight: f64,
}

impl Default for WeightedScoreStrategy {
    fn default() -> Self {
        Self {
            price_weight: 0.6,
            duration_weight: 0.2,
            stops_weight: 0.15,
            amenities_weight: 0.05,
        }
    }
}

impl WeightedScoreStrategy {
    /// Creates a strategy with the default weights.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a strategy with custom weights.
    #[must_use]
    pub fn with_weights(price: f64, duration: f64, stops: f64, amenities: f64) -> Self {
        Self {
            price_weight: price,
            duration_weight: duration,
            stops_weight: stops,
            amenities_weight: amenities,
        }
    }
}

impl RankingStrategy for WeightedScoreStrategy {
    fn rank(&self, flights: &mut [Flight]) {
        if flights.is_empty() {
            return;
        }

        let price = Range::of(flights.iter().map(price_of));
        let duration = Range::of(flights.iter().map(|f| f64::from(f.duration.total_minutes)));
        let stops = Range::of(flights.iter().map(|f| f64::from(f.stops)));
        let amenities = Range::of(flights.iter().map(|f| count_as_f64(f.amenity_count())));

        for flight in flights.iter_mut() {
            let price_score = price.normalize(price_of(flight));
            let duration_score = duration.normalize(f64::from(flight.duration.total_minutes));
            let stops_score = stops.normalize(f64::from(flight.stops));
            let amenities_score = 1.0 - amenities.normalize(count_as_f64(flight.amenity_count()));

            flight.score = self.price_weight * price_score
                + self.duration_weight * duration_score
                + self.stops_weight * stops_score
                + self.amenities_weight * amenities_score;
        }
    }

    fn name(&self) -> &'static str {
        "WeightedScore"
    }
}
