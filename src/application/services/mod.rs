//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides application-level services including:
//! - [`FlightAggregationEngine`]: Cached, concurrent flight search
//! - [`RankingStrategy`]: Strategies for scoring offers
//! - [`filter_flights`] and [`sort_flights`]: Response shaping

pub mod flight_aggregation;
pub mod flight_filter;
pub mod flight_sort;
pub mod ranking_strategy;

pub use flight_aggregation::{AggregatorConfig, FlightAggregationEngine};
pub use flight_filter::filter_flights;
pub use flight_sort::sort_flights;
pub use ranking_strategy::{RankingStrategy, WeightedScoreStrategy, normalize};
