//! Factory pattern for web-search backends.
//!
//! Search providers register factories keyed by a type name, so a backend
//! can be selected from configuration (`providers.search_provider`) without
//! an enum anyone has to extend.

use std::collections::BTreeMap;
use std::sync::Arc;

use verifact_core::config::ProvidersConfig;

use crate::capabilities::{CapabilityError, WebSearchProvider};

/// Factory for creating a search provider from configuration.
pub trait SearchProviderFactory: Send + Sync {
    /// Unique identifier for this backend, e.g. "tavily".
    fn provider_type(&self) -> &'static str;

    /// Create a provider instance. Credential loading happens here, so a
    /// missing key surfaces as [`CapabilityError::NotConfigured`] at wiring
    /// time rather than on the first query.
    fn create(
        &self,
        providers: &ProvidersConfig,
    ) -> Result<Arc<dyn WebSearchProvider>, CapabilityError>;

    /// Human-readable description.
    fn description(&self) -> &'static str {
        "web search provider"
    }
}

/// Registry of available search backends.
#[derive(Default)]
pub struct SearchProviderRegistry {
    factories: BTreeMap<String, Arc<dyn SearchProviderFactory>>,
}

impl SearchProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every compiled-in backend registered.
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "tavily")]
        registry.register(Arc::new(super::tavily::TavilySearchFactory));
        #[cfg(feature = "serp")]
        registry.register(Arc::new(super::serp::SerpSearchFactory));
        registry
    }

    /// Register a factory, replacing any existing one of the same type.
    pub fn register(&mut self, factory: Arc<dyn SearchProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    /// Create a provider by type name.
    pub fn create(
        &self,
        provider_type: &str,
        providers: &ProvidersConfig,
    ) -> Result<Arc<dyn WebSearchProvider>, CapabilityError> {
        self.factories
            .get(provider_type)
            .ok_or_else(|| {
                CapabilityError::NotConfigured(format!(
                    "unknown search provider '{provider_type}'; available: {:?}",
                    self.available_types()
                ))
            })?
            .create(providers)
    }

    /// List registered backend names.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }
}

impl std::fmt::Debug for SearchProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}
