//! # Configuration
//!
//! Service configuration loaded through the `config` crate.
//!
//! Sources are layered, later ones overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`config/aggregator.toml` unless a path is given)
//! 3. Environment variables prefixed `AGGREGATOR_`, with `__` between nested
//!    keys, e.g. `AGGREGATOR_HTTP__PORT=9090` or `AGGREGATOR_REDIS__URL=...`
//!
//! # Example
//!
//! ```toml
//! log_level = "debug"
//!
//! [http]
//! port = 8080
//!
//! [cache]
//! ttl_secs = 300
//! lock_ttl_secs = 10
//!
//! [[providers]]
//! name = "Garuda"
//! url = "http://garuda.internal/search"
//! timeout_ms = 1500
//!
//! [[providers]]
//! name = "Lion"
//! path = "data/lion_air.json"
//! ```

use crate::application::services::AggregatorConfig;
use crate::infrastructure::providers::ProviderPolicy;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_FILE: &str = "config/aggregator.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "AGGREGATOR";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The configuration was read but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit JSON log lines.
    #[serde(default)]
    pub log_json: bool,
    /// HTTP server settings.
    #[serde(default)]
    pub http: HttpSettings,
    /// Redis settings. Without a URL the in-process store is used.
    #[serde(default)]
    pub redis: RedisSettings,
    /// Cache and lock lifetimes.
    #[serde(default)]
    pub cache: CacheSettings,
    /// Providers to register.
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deadline for one search request. Zero disables it.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Redis settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedisSettings {
    /// Connection URL such as `redis://127.0.0.1:6379`.
    #[serde(default)]
    pub url: Option<String>,
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// Lifetime of a cached search.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    /// Lifetime of the write lock.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

/// A single provider entry.
///
/// Exactly one of `url` and `path` selects the source; `url` wins if both
/// are present.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Registry name, also used in logs and rate limit keys.
    pub name: String,
    /// HTTP endpoint answering criteria with a flight feed.
    #[serde(default)]
    pub url: Option<String>,
    /// JSON file holding a flight feed.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Bound on one provider call, retries included.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Shared rate limit. Zero disables it.
    #[serde(default = "default_rate_limit_rps")]
    pub rate_limit_rps: u32,
    /// First backoff step.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout_ms() -> u64 {
    5000
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_lock_ttl_secs() -> u64 {
    10
}
fn default_provider_timeout_ms() -> u64 {
    2000
}
fn default_max_retries() -> u32 {
    3
}
fn default_rate_limit_rps() -> u32 {
    10
}
fn default_backoff_base_ms() -> u64 {
    200
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            lock_ttl_secs: default_lock_ttl_secs(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            http: HttpSettings::default(),
            redis: RedisSettings::default(),
            cache: CacheSettings::default(),
            providers: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `config/aggregator.toml` (optional) and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed and
    /// `ConfigError::Invalid` if the result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE), false)
    }

    /// Loads configuration from `path` and the environment.
    ///
    /// A missing file is an error only when `required` is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source is malformed and
    /// `ConfigError::Invalid` if the result fails validation.
    pub fn load_from(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from(path).required(required))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values serde cannot check.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for zero lifetimes, duplicate provider
    /// names, or a provider without a source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::invalid("cache.ttl_secs must be positive"));
        }
        if self.cache.lock_ttl_secs == 0 {
            return Err(ConfigError::invalid("cache.lock_ttl_secs must be positive"));
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                return Err(ConfigError::invalid("provider name must not be empty"));
            }
            if !seen.insert(provider.name.as_str()) {
                return Err(ConfigError::invalid(format!(
                    "provider {} is configured twice",
                    provider.name
                )));
            }
            if provider.url.is_none() && provider.path.is_none() {
                return Err(ConfigError::invalid(format!(
                    "provider {} needs a url or a path",
                    provider.name
                )));
            }
        }
        Ok(())
    }

    /// Returns the engine settings.
    #[must_use]
    pub fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig::default()
            .with_cache_ttl(Duration::from_secs(self.cache.ttl_secs))
            .with_lock_ttl(Duration::from_secs(self.cache.lock_ttl_secs))
    }

    /// Returns the request deadline, if any.
    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.http.request_timeout_ms > 0)
            .then(|| Duration::from_millis(self.http.request_timeout_ms))
    }
}

impl ProviderSettings {
    /// Returns the call policy of this provider.
    #[must_use]
    pub fn policy(&self) -> ProviderPolicy {
        ProviderPolicy::default()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_max_retries(self.max_retries)
            .with_backoff_base(Duration::from_millis(self.backoff_base_ms))
            .with_rate_limit(self.rate_limit_rps)
    }
}
