//! # In-Memory Store
//!
//! Process-local [`KeyValueStore`] with per-entry expiry. Used when no Redis
//! URL is configured and in tests.
//!
//! Reads drop the expired entry they hit. Writes sweep the whole map at most
//! once per sweep interval, so keys that are never read again do not pile up.

use crate::infrastructure::cache::error::CacheResult;
use crate::infrastructure::cache::traits::KeyValueStore;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default minimum time between two write-triggered sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// DashMap-backed store with lazy expiry and periodic sweeps.
#[derive(Debug)]
pub struct InMemoryStore {
    data: DashMap<String, StoredValue>,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            data: DashMap::new(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            last_sweep: Mutex::new(Instant::now()),
        }
    }
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum time between write-triggered sweeps.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.data.len();
        self.data.retain(|_, entry| entry.is_live(now));
        before.saturating_sub(self.data.len())
    }

    /// Sweeps if the interval has passed since the last sweep. A concurrent
    /// writer already sweeping is left alone.
    fn maybe_sweep(&self) {
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        let now = Instant::now();
        if now.duration_since(*last) < self.sweep_interval {
            return;
        }
        *last = now;
        drop(last);

        let dropped = self.purge_expired();
        if dropped > 0 {
            debug!(dropped, remaining = self.data.len(), "swept expired cache entries");
        }
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.data.iter().filter(|entry| entry.is_live(now)).count()
    }

    /// Returns true if no live entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `key` holds a live value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.data.get(key).is_some_and(|entry| entry.is_live(now))
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn set_nx_px(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        self.maybe_sweep();
        let now = Instant::now();
        match self.data.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    return Ok(false);
                }
                occupied.insert(StoredValue::new(value, ttl));
                Ok(true)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StoredValue::new(value, ttl));
                Ok(true)
            }
        }
    }

    async fn set_px(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.maybe_sweep();
        self.data.insert(key.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let found = self
            .data
            .get(key)
            .map(|entry| (entry.is_live(now), entry.value.clone()));
        match found {
            Some((true, value)) => Ok(Some(value)),
            Some((false, _)) => {
                self.data.remove_if(key, |_, entry| !entry.is_live(now));
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn del(&self, key: &str) -> CacheResult<()> {
        self.data.remove(key);
        Ok(())
    }
}
