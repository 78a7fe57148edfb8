//! # Resilient Provider
//!
//! Wraps a [`FlightSource`] in the provider call envelope.
//!
//! Every call is bounded by the provider timeout and observes the caller's
//! cancellation token. Each attempt first takes a unit of the shared rate
//! limit budget, then fetches. Transient failures are retried with
//! exponential backoff; anything else ends the call.
//!
//! The budget is taken before the fetch, so an attempt that then fails
//! transiently has still spent its unit and a retry can be rejected as
//! rate limited.

use crate::domain::entities::flight::Flight;
use crate::domain::value_objects::SearchCriteria;
use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use crate::infrastructure::providers::rate_limit::RateLimiter;
use crate::infrastructure::providers::traits::{FlightProvider, FlightSource};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Call policy for a single provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderPolicy {
    /// Bound on the whole call, retries and backoff included.
    pub timeout: Duration,
    /// Additional attempts after the first transient failure.
    pub max_retries: u32,
    /// Backoff before retry `n` is `backoff_base * 2^n`.
    pub backoff_base: Duration,
    /// Requests per second admitted by the shared limiter. Zero disables it.
    pub rate_limit_rps: u32,
}

impl Default for ProviderPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(2000),
            max_retries: 3,
            backoff_base: Duration::from_millis(200),
            rate_limit_rps: 10,
        }
    }
}

impl ProviderPolicy {
    /// Sets the call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of retries.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff base.
    #[must_use]
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Sets the rate limit in requests per second.
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit_rps: u32) -> Self {
        self.rate_limit_rps = rate_limit_rps;
        self
    }

    /// Returns the wait before the retry that follows `attempt` (zero based).
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor)
    }

    /// Returns the total number of attempts allowed.
    #[inline]
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// A provider built from a raw source, a shared limiter and a call policy.
#[derive(Debug, Clone)]
pub struct ResilientProvider {
    name: String,
    source: Arc<dyn FlightSource>,
    limiter: Arc<dyn RateLimiter>,
    policy: ProviderPolicy,
}

impl ResilientProvider {
    /// Creates a provider with the default policy.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source: Arc<dyn FlightSource>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            limiter,
            policy: ProviderPolicy::default(),
        }
    }

    /// Replaces the call policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the call policy.
    #[must_use]
    pub fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    /// Returns the shared rate limit key for this provider.
    #[must_use]
    pub fn rate_limit_key(&self) -> String {
        format!("limit:{}", self.name)
    }

    async fn attempt_all(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> ProviderResult<Vec<Flight>> {
        let key = self.rate_limit_key();
        let attempts = self.policy.max_attempts();
        let mut last = String::new();

        for attempt in 0..attempts {
            if !self.limiter.allow(&key, self.policy.rate_limit_rps).await? {
                warn!(provider = %self.name, attempt = attempt + 1, "rate limit exceeded");
                return Err(ProviderError::rate_limited(key));
            }

            match self.source.fetch(criteria).await {
                Ok(flights) => {
                    debug!(
                        provider = %self.name,
                        attempt = attempt + 1,
                        count = flights.len(),
                        "provider search succeeded"
                    );
                    return Ok(flights);
                }
                Err(e) if e.is_transient() => {
                    warn!(
                        provider = %self.name,
                        attempt = attempt + 1,
                        error = %e,
                        "provider search failed"
                    );
                    last = e.to_string();
                }
                Err(e) => return Err(e),
            }

            if attempt + 1 < attempts {
                let backoff = self.policy.backoff_for(attempt);
                info!(
                    provider = %self.name,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    next_attempt = attempt + 2,
                    "retrying with exponential backoff"
                );
                tokio::select! {
                    () = cancel.cancelled() => return Err(ProviderError::cancelled()),
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }

        Err(ProviderError::retries_exhausted(attempts, last))
    }
}

#[async_trait]
impl FlightProvider for ResilientProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> ProviderResult<Vec<Flight>> {
        if cancel.is_cancelled() {
            return Err(ProviderError::cancelled());
        }

        let timeout = self.policy.timeout;
        tokio::select! {
            () = cancel.cancelled() => Err(ProviderError::cancelled()),
            result = tokio::time::timeout(timeout, self.attempt_all(criteria, cancel)) => {
                result.unwrap_or_else(|_| {
                    Err(ProviderError::timeout(
                        u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    ))
                })
            }
        }
    }
}
