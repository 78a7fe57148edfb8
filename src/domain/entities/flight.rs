//! # Flight
//!
//! Canonical flight offer shared by every provider.
//!
//! Providers own the mapping from their wire schema into [`Flight`]; the
//! aggregation core only filters offers and annotates them with a ranking
//! score.
//!
//! # Examples
//!
//! ```
//! use flight_aggregator::domain::entities::flight::{FlightDuration, FlightPrice};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(FlightDuration::from_minutes(125).formatted, "2h 5m");
//! assert_eq!(FlightPrice::new(Decimal::from(1_250_000), "IDR").formatted, "Rp1.250.000");
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Airline operating the flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airline {
    /// Display name.
    pub name: String,
    /// IATA code, e.g. `GA`.
    pub code: String,
}

impl Airline {
    /// Creates a new airline.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Departure or arrival point of a flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightPoint {
    /// Airport code.
    pub airport: String,
    /// City name.
    #[serde(default)]
    pub city: String,
    /// RFC 3339 datetime carrying the local UTC offset of the airport.
    pub datetime: String,
    /// Unix epoch seconds.
    pub timestamp: i64,
}

impl FlightPoint {
    /// Creates a flight point from a timezone-aware datetime.
    #[must_use]
    pub fn new(
        airport: impl Into<String>,
        city: impl Into<String>,
        at: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Self {
            airport: airport.into(),
            city: city.into(),
            datetime: at.to_rfc3339(),
            timestamp: at.timestamp(),
        }
    }
}

/// Flight duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightDuration {
    /// Total duration in minutes.
    pub total_minutes: u32,
    /// Human readable form, e.g. `2h 5m`.
    #[serde(default)]
    pub formatted: String,
}

impl FlightDuration {
    /// Creates a duration and derives its human readable form.
    #[must_use]
    pub fn from_minutes(total_minutes: u32) -> Self {
        Self {
            total_minutes,
            formatted: format_minutes(total_minutes),
        }
    }
}

/// Ticket price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightPrice {
    /// Price amount.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Display form of the amount.
    #[serde(default)]
    pub formatted: String,
}

impl FlightPrice {
    /// Creates a price and derives its display form.
    #[must_use]
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        let currency = currency.into();
        let formatted = format_price(amount, &currency);
        Self {
            amount,
            currency,
            formatted,
        }
    }
}

/// Baggage allowance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baggage {
    /// Cabin baggage allowance, e.g. `7kg`.
    pub carry_on: String,
    /// Checked baggage allowance, e.g. `20kg`.
    pub checked: String,
}

/// A canonical flight offer.
///
/// `score` is only meaningful after the ranking stage and is recomputed for
/// every response; providers leave it at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    /// Provider-qualified identifier.
    pub id: String,
    /// Name of the provider that returned the offer.
    pub provider: String,
    /// Operating airline.
    pub airline: Airline,
    /// Flight number.
    #[serde(default)]
    pub flight_number: String,
    /// Departure point.
    pub departure: FlightPoint,
    /// Arrival point.
    pub arrival: FlightPoint,
    /// Duration.
    pub duration: FlightDuration,
    /// Number of stops, 0 for direct flights.
    pub stops: u32,
    /// Price.
    pub price: FlightPrice,
    /// Seats left at this price.
    pub available_seats: u32,
    /// Cabin class.
    pub cabin_class: String,
    /// Aircraft model.
    #[serde(default)]
    pub aircraft: Option<String>,
    /// Amenities in provider order. `null` reads as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub amenities: Vec<String>,
    /// Baggage allowance.
    #[serde(default)]
    pub baggage: Baggage,
    /// Ranking score, lower is better.
    #[serde(default)]
    pub score: f64,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Flight {
    /// Returns the number of amenities.
    #[inline]
    #[must_use]
    pub fn amenity_count(&self) -> usize {
        self.amenities.len()
    }

    /// Returns true for direct flights.
    #[inline]
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.stops == 0
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Flight({} {} {}->{} {} {})",
            self.id,
            self.airline.code,
            self.departure.airport,
            self.arrival.airport,
            self.price.amount,
            self.price.currency
        )
    }
}

fn format_minutes(total_minutes: u32) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    match (hours, minutes) {
        (h, 0) => format!("{h}h"),
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m}m"),
    }
}

fn format_price(amount: Decimal, currency: &str) -> String {
    if currency.eq_ignore_ascii_case("IDR") {
        return format_rupiah(amount);
    }
    format!("{} {}", currency, amount.round_dp(2))
}

/// Formats an amount the Indonesian way, dots as thousands separators.
fn format_rupiah(amount: Decimal) -> String {
    let rounded = amount.round();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    if negative {
        format!("Rp-{grouped}")
    } else {
        format!("Rp{grouped}")
    }
}
