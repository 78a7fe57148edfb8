//! # Application Layer
//!
//! The flight search use case: the aggregation engine, its response shapes
//! and its caller-visible errors.

pub mod dto;
pub mod error;
pub mod services;

pub use dto::{ErrorResponse, SearchFlightResponse};
pub use error::{AggregationError, AggregationResult};
