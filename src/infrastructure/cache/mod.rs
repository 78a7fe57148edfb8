//! # Flight Cache
//!
//! Shared cache of search results and the advisory lock that decides which
//! concurrent search writes them.

pub mod error;
pub mod flight_cache;
pub mod redis_store;
pub mod store;
pub mod traits;

pub use error::{CacheError, CacheResult};
pub use flight_cache::FlightCache;
pub use redis_store::RedisStore;
pub use store::InMemoryStore;
pub use traits::{FlightCacher, KeyValueStore};
