//! # Provider Registry
//!
//! Immutable set of providers, built once at startup and shared by every
//! aggregation through an `Arc`.

use crate::infrastructure::providers::traits::FlightProvider;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

/// Providers keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn FlightProvider>>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider under its own name.
    ///
    /// A later registration with the same name replaces the earlier one.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn FlightProvider>) -> Self {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            warn!(provider = %name, "provider registered twice, keeping the latest");
        }
        self
    }

    /// Returns the provider registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn FlightProvider>> {
        self.providers.get(name).cloned()
    }

    /// Returns every provider, ordered by name.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn FlightProvider>> {
        self.providers.values().cloned().collect()
    }

    /// Returns the registered names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Returns the number of providers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl FromIterator<Arc<dyn FlightProvider>> for ProviderRegistry {
    fn from_iter<I: IntoIterator<Item = Arc<dyn FlightProvider>>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |registry, provider| registry.with_provider(provider))
    }
}
