//! # Cache Errors
//!
//! Error types for the shared flight cache.
//!
//! Every cache error is soft from the caller's point of view: a failed read
//! degrades to a live fan-out and a failed write or lock call is logged.
//!
//! # Examples
//!
//! ```
//! use flight_aggregator::infrastructure::cache::error::CacheError;
//!
//! let error = CacheError::miss("flight:cache:2025-12-15:CGK:DPS:economy:1");
//! assert!(error.is_miss());
//!
//! let error = CacheError::backend("connection refused");
//! assert!(!error.is_miss());
//! ```

use thiserror::Error;

/// Error type for cache operations.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The key is absent or expired.
    #[error("cache miss: {key}")]
    Miss {
        /// Key that was looked up.
        key: String,
    },

    /// The store could not be reached or rejected the command.
    #[error("cache backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
    },

    /// A value could not be encoded or decoded.
    #[error("cache serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },
}

impl CacheError {
    /// Creates a miss error.
    #[must_use]
    pub fn miss(key: impl Into<String>) -> Self {
        Self::Miss { key: key.into() }
    }

    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns true if the key was simply not there.
    #[must_use]
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss { .. })
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        Self::backend(error.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
