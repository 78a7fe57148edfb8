//! # Infrastructure Layer
//!
//! Adapters to the outside world: flight providers and the shared cache.

pub mod cache;
pub mod providers;
