//! # Provider Errors
//!
//! Error types for provider calls.
//!
//! Transient errors are retried by the resilience envelope; every other
//! variant ends the call.
//!
//! # Examples
//!
//! ```
//! use flight_aggregator::infrastructure::providers::error::ProviderError;
//!
//! let error = ProviderError::transient("upstream returned 503");
//! assert!(error.is_transient());
//!
//! let error = ProviderError::rate_limited("limit:Garuda");
//! assert!(!error.is_transient());
//! assert!(error.is_rate_limited());
//! ```

use thiserror::Error;

/// Error type for provider calls.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// The whole call exceeded the provider timeout.
    #[error("provider timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The caller cancelled the search.
    #[error("provider call cancelled")]
    Cancelled,

    /// The shared rate limiter rejected the attempt.
    #[error("provider rate limit exceeded: {message}")]
    RateLimited {
        /// Error message.
        message: String,
    },

    /// Every attempt failed with a transient error.
    #[error("provider retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Message of the last transient failure.
        last: String,
    },

    /// A failure that may succeed on retry.
    #[error("provider temporarily unavailable: {message}")]
    Transient {
        /// Error message.
        message: String,
    },

    /// A non-retryable failure from the provider's own IO or parsing.
    #[error("provider upstream error: {message}")]
    Upstream {
        /// Error message.
        message: String,
    },
}

impl ProviderError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    /// Creates a rate limited error.
    #[must_use]
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::RateLimited {
            message: message.into(),
        }
    }

    /// Creates a retries exhausted error.
    #[must_use]
    pub fn retries_exhausted(attempts: u32, last: impl Into<String>) -> Self {
        Self::RetriesExhausted {
            attempts,
            last: last.into(),
        }
    }

    /// Creates a transient error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates an upstream error.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    /// Returns true if the attempt may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns true if the attempt was rejected by the rate limiter.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns true if the call ran out of time or was cancelled.
    #[must_use]
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled)
    }
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_is_retryable() {
        assert!(ProviderError::transient("503").is_transient());
        assert!(!ProviderError::timeout(100).is_transient());
        assert!(!ProviderError::cancelled().is_transient());
        assert!(!ProviderError::rate_limited("x").is_transient());
        assert!(!ProviderError::retries_exhausted(3, "503").is_transient());
        assert!(!ProviderError::upstream("bad json").is_transient());
    }

    #[test]
    fn deadline_classification() {
        assert!(ProviderError::timeout(100).is_deadline());
        assert!(ProviderError::cancelled().is_deadline());
        assert!(!ProviderError::upstream("x").is_deadline());
    }

    #[test]
    fn display_format() {
        let error = ProviderError::timeout(1500);
        assert!(error.to_string().contains("1500ms"));

        let error = ProviderError::retries_exhausted(4, "connection reset");
        let display = error.to_string();
        assert!(display.contains("4 attempts"));
        assert!(display.contains("connection reset"));
    }
}
