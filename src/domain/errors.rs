//! # Domain Errors
//!
//! Errors raised by domain types when their invariants are violated.

use thiserror::Error;

/// Error type for domain rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// A request field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// A time-of-day value could not be parsed.
    #[error("invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    /// A flight timestamp could not be parsed.
    #[error("invalid flight datetime: {0}")]
    InvalidDatetime(String),
}

impl DomainError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns true if this error describes bad caller input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
