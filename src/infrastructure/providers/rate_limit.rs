//! # Provider Rate Limiting
//!
//! Shared request budgets keyed by provider.
//!
//! Both limiters implement leaky-bucket semantics: requests are admitted at
//! a steady `rate_per_second` with bursts of up to `rate_per_second`
//! requests.
//!
//! - [`GovernorRateLimiter`]: in-process budget, shared by every
//!   aggregation running in this process
//! - [`RedisRateLimiter`]: GCRA over Redis, shared by every process that
//!   talks to the same Redis

use crate::infrastructure::providers::error::{ProviderError, ProviderResult};
use async_trait::async_trait;
use dashmap::DashMap;
use governor::{DefaultDirectRateLimiter, Quota};
use redis::aio::ConnectionManager;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

/// A shared rate limiter consulted before every provider attempt.
#[async_trait]
pub trait RateLimiter: Send + Sync + fmt::Debug {
    /// Takes one unit of budget for `key`.
    ///
    /// Returns `Ok(false)` when the budget is exhausted. A rate of zero
    /// disables limiting for the key.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::Upstream` when the limiter backend fails.
    async fn allow(&self, key: &str, rate_per_second: u32) -> ProviderResult<bool>;
}

/// In-process rate limiter backed by `governor`.
///
/// One direct limiter is created per key on first use; its quota is fixed
/// by the rate passed on that first call.
#[derive(Default)]
pub struct GovernorRateLimiter {
    limiters: DashMap<String, Arc<DefaultDirectRateLimiter>>,
}

impl GovernorRateLimiter {
    /// Creates an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn limiter_for(&self, key: &str, rate: NonZeroU32) -> Arc<DefaultDirectRateLimiter> {
        if let Some(existing) = self.limiters.get(key) {
            return Arc::clone(existing.value());
        }
        let entry = self
            .limiters
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(DefaultDirectRateLimiter::direct(Quota::per_second(rate))));
        Arc::clone(entry.value())
    }
}

impl fmt::Debug for GovernorRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GovernorRateLimiter")
            .field("keys", &self.limiters.len())
            .finish()
    }
}

#[async_trait]
impl RateLimiter for GovernorRateLimiter {
    async fn allow(&self, key: &str, rate_per_second: u32) -> ProviderResult<bool> {
        let Some(rate) = NonZeroU32::new(rate_per_second) else {
            return Ok(true);
        };
        Ok(self.limiter_for(key, rate).check().is_ok())
    }
}

/// Generic cell rate algorithm, evaluated atomically inside Redis.
///
/// KEYS[1] holds the theoretical arrival time in milliseconds. ARGV[1] is
/// the emission interval and ARGV[2] the burst tolerance, both in
/// milliseconds.
const GCRA_SCRIPT: &str = r"
local now = redis.call('TIME')
local now_ms = tonumber(now[1]) * 1000 + math.floor(tonumber(now[2]) / 1000)
local emission = tonumber(ARGV[1])
local tolerance = tonumber(ARGV[2])
local tat = tonumber(redis.call('GET', KEYS[1]))
if tat == nil or tat < now_ms then
    tat = now_ms
end
local new_tat = tat + emission
if new_tat - now_ms > tolerance then
    return 0
end
redis.call('SET', KEYS[1], new_tat, 'PX', math.ceil(new_tat - now_ms))
return 1
";

/// Cluster-wide rate limiter backed by Redis.
#[derive(Clone)]
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    script: Arc<redis::Script>,
}

impl RedisRateLimiter {
    /// Creates a limiter on an existing connection manager.
    #[must_use]
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            script: Arc::new(redis::Script::new(GCRA_SCRIPT)),
        }
    }
}

impl fmt::Debug for RedisRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisRateLimiter").finish_non_exhaustive()
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn allow(&self, key: &str, rate_per_second: u32) -> ProviderResult<bool> {
        if rate_per_second == 0 {
            return Ok(true);
        }
        let emission_ms = 1000.0 / f64::from(rate_per_second);
        let tolerance_ms = emission_ms * f64::from(rate_per_second);

        let mut conn = self.conn.clone();
        let allowed: i64 = self
            .script
            .key(key)
            .arg(emission_ms)
            .arg(tolerance_ms)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| ProviderError::upstream(format!("failed to rate limit: {e}")))?;
        Ok(allowed == 1)
    }
}
