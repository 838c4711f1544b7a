use thiserror::Error;

/// Unified error type for the entire normalized-prices-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Market Data ─────────────────────────────────────────────────
    #[error("No data available: {0}")]
    DataUnavailable(String),

    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("Provider {provider} timed out after {seconds}s")]
    ProviderTimeout { provider: String, seconds: u64 },

    #[error("Provider error ({provider}): {message}")]
    Provider { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No price provider registered")]
    NoProvider,

    // ── Configuration / Validation ──────────────────────────────────
    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl CoreError {
    /// True for failures of the remote side (timeouts, provider or transport errors),
    /// as opposed to "the provider answered but had nothing".
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            CoreError::ProviderTimeout { .. } | CoreError::Provider { .. } | CoreError::Network(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors often contain full URLs; strip query parameters so
        // API keys never end up in logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
