//! # Flight Providers
//!
//! Provider gateway: the [`FlightProvider`] port, the resilience envelope
//! around raw sources, shared rate limiting and the provider registry.

pub mod error;
pub mod http_client;
pub mod rate_limit;
pub mod registry;
pub mod resilient;
pub mod sources;
pub mod traits;

pub use error::{ProviderError, ProviderResult};
pub use rate_limit::{GovernorRateLimiter, RateLimiter, RedisRateLimiter};
pub use registry::ProviderRegistry;
pub use resilient::{ProviderPolicy, ResilientProvider};
pub use sources::{FileFlightSource, FlightFeed, HttpFlightSource, retain_matching};
pub use traits::{FlightProvider, FlightSource};
