use std::collections::HashMap;

use super::alphavantage::AlphaVantageProvider;
use super::traits::PriceProvider;
use super::yahoo_finance::YahooFinanceProvider;

/// Ordered list of market data providers.
///
/// The first registered provider is the primary source; later ones are
/// fallbacks tried in registration order when an earlier one fails.
/// New providers can be added without modifying existing code.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn PriceProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();

        // Yahoo Finance: closes, dividends and yield, no API key needed (primary)
        match YahooFinanceProvider::new() {
            Ok(yahoo) => registry.register(Box::new(yahoo)),
            Err(e) => tracing::warn!(error = %e, "Yahoo Finance provider unavailable"),
        }

        // Alpha Vantage: closes only, requires an API key (fallback)
        if let Some(key) = api_keys.get("alphavantage") {
            registry.register(Box::new(AlphaVantageProvider::new(key.clone())));
        }

        registry
    }

    /// Register a new price provider at the end of the fallback chain.
    pub fn register(&mut self, provider: Box<dyn PriceProvider>) {
        self.providers.push(provider);
    }

    /// All providers, in fallback order.
    pub fn providers(&self) -> Vec<&dyn PriceProvider> {
        self.providers.iter().map(|p| p.as_ref()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
