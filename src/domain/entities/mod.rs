//! # Domain Entities
//!
//! - [`Flight`]: canonical flight offer produced by providers

pub mod flight;

pub use flight::{Airline, Baggage, Flight, FlightDuration, FlightPoint, FlightPrice};
