use std::future::Future;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::frame::Frame;
use crate::models::price::{Dividend, IncomeProfile, PricePoint};
use crate::models::ticker_set::is_well_formed_symbol;
use crate::models::timeline::Timeline;
use crate::providers::registry::ProviderRegistry;
use crate::providers::traits::PriceProvider;
use crate::services::series_math::fill_gaps;

/// Default bound on a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches market data from the registered providers and maps it onto the
/// session timeline.
///
/// - Providers are tried in registration order; the next one is used when
///   an earlier one fails or has nothing for the symbol.
/// - Every provider call is bounded by `timeout` and reported as
///   `CoreError::ProviderTimeout` when it runs over.
/// - Closes are re-indexed onto the timeline and gap-filled (back, then
///   forward), so downstream series never see a missing value.
pub struct PriceService {
    registry: ProviderRegistry,
    timeout: Duration,
}

impl PriceService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            registry,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the names of all registered providers, in fallback order.
    pub fn provider_names(&self) -> Vec<String> {
        self.registry
            .providers()
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Closing prices for `tickers`, one column per ticker, aligned with `timeline`.
    ///
    /// A ticker the providers know nothing about is left out (with a warning).
    /// Fails with `DataUnavailable` when no ticker has data, and propagates
    /// provider failures: without the closes there is nothing to show.
    pub async fn fetch_closes(
        &self,
        tickers: &[String],
        timeline: &Timeline,
    ) -> Result<Frame, CoreError> {
        let mut frame = Frame::new(timeline.len());

        for ticker in tickers {
            if frame.contains(ticker) {
                continue;
            }
            let points = self.fetch_points(ticker, timeline).await?;
            match align_to_timeline(&points, timeline) {
                Some(values) => frame.push_column(ticker.as_str(), values)?,
                None => tracing::warn!(%ticker, "no closing prices on the timeline, skipping"),
            }
        }

        if frame.is_empty() {
            return Err(CoreError::DataUnavailable(format!(
                "no prices for {} between {} and {}",
                tickers.join(", "),
                timeline.first(),
                timeline.last()
            )));
        }
        Ok(frame)
    }

    /// Closing prices for a single ticker, aligned with `timeline`.
    pub async fn fetch_close(
        &self,
        ticker: &str,
        timeline: &Timeline,
    ) -> Result<Vec<f64>, CoreError> {
        let points = self.fetch_points(ticker, timeline).await?;
        align_to_timeline(&points, timeline).ok_or_else(|| {
            CoreError::DataUnavailable(format!(
                "no prices for {ticker} between {} and {}",
                timeline.first(),
                timeline.last()
            ))
        })
    }

    /// Dividend history over the timeline span. Empty when the ticker pays none.
    ///
    /// Only providers with an income feed are asked. The first non-empty
    /// history wins; an empty answer counts only if no provider failed, since
    /// a failure means the history is unknown rather than empty.
    pub async fn fetch_dividends(
        &self,
        ticker: &str,
        timeline: &Timeline,
    ) -> Result<Vec<Dividend>, CoreError> {
        let (from, to) = (timeline.first(), timeline.last());
        let mut last_error = None;

        for provider in self.income_providers()? {
            match self
                .bounded(provider.name(), provider.get_dividends(ticker, from, to))
                .await
            {
                Ok(dividends) if !dividends.is_empty() => return Ok(dividends),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(provider = provider.name(), %ticker, error = %e, "dividend fetch failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }

    /// Disclosed annual yield, 0 when no provider knows it.
    /// Fails when a provider failed and none reported a positive yield.
    pub async fn fetch_yield(&self, ticker: &str) -> Result<f64, CoreError> {
        let mut last_error = None;

        for provider in self.income_providers()? {
            match self
                .bounded(provider.name(), provider.get_annual_yield(ticker))
                .await
            {
                Ok(y) if y.is_finite() && y > 0.0 => return Ok(y),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(provider = provider.name(), %ticker, error = %e, "yield fetch failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(0.0),
        }
    }

    /// How `ticker` pays its holders: its dividend history if it has one,
    /// otherwise its disclosed yield, otherwise nothing.
    ///
    /// Fails when the dividend history is unknown; the yield is never used
    /// as a stand-in for a dividend lookup that did not complete.
    pub async fn fetch_income(
        &self,
        ticker: &str,
        timeline: &Timeline,
    ) -> Result<IncomeProfile, CoreError> {
        let dividends = self.fetch_dividends(ticker, timeline).await?;
        if !dividends.is_empty() {
            return Ok(IncomeProfile::Dividends(dividends));
        }
        let annual_yield = self.fetch_yield(ticker).await?;
        Ok(IncomeProfile::from_parts(dividends, annual_yield))
    }

    /// Best-effort existence check. Never fails: malformed symbols are
    /// rejected without a remote call, and any provider error counts as "no".
    pub async fn probe_exists(&self, ticker: &str) -> bool {
        if !is_well_formed_symbol(ticker) {
            return false;
        }

        for provider in self.registry.providers() {
            match self.bounded(provider.name(), provider.probe(ticker)).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(provider = provider.name(), %ticker, error = %e, "probe failed");
                }
            }
        }
        false
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Registered providers that have an income feed, in fallback order.
    fn income_providers(&self) -> Result<Vec<&dyn PriceProvider>, CoreError> {
        let providers = self.registry.providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider);
        }
        Ok(providers
            .into_iter()
            .filter(|p| p.reports_income())
            .collect())
    }

    /// Raw closes for `ticker` from the first provider that has any.
    async fn fetch_points(
        &self,
        ticker: &str,
        timeline: &Timeline,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let providers = self.registry.providers();
        if providers.is_empty() {
            return Err(CoreError::NoProvider);
        }

        let (from, to) = (timeline.first(), timeline.last());
        let mut last_error = None;
        let mut answered = false;

        for provider in &providers {
            match self
                .bounded(provider.name(), provider.get_price_range(ticker, from, to))
                .await
            {
                Ok(points) if !points.is_empty() => return Ok(points),
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), %ticker, "provider returned no closes");
                    answered = true;
                }
                Err(e) => {
                    tracing::debug!(provider = provider.name(), %ticker, error = %e, "close fetch failed, trying next provider");
                    last_error = Some(e);
                }
            }
        }

        // "No data" from any provider outranks a failure from another.
        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(Vec::new()),
        }
    }

    /// Run a provider call under the configured timeout.
    async fn bounded<T>(
        &self,
        provider: &str,
        call: impl Future<Output = Result<T, CoreError>>,
    ) -> Result<T, CoreError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| CoreError::ProviderTimeout {
                provider: provider.to_string(),
                seconds: self.timeout.as_secs(),
            })?
    }
}

/// Place `points` on the timeline by exact date and fill the gaps.
/// Returns `None` when no usable close lands on the timeline.
fn align_to_timeline(points: &[PricePoint], timeline: &Timeline) -> Option<Vec<f64>> {
    let mut values = vec![f64::NAN; timeline.len()];
    let mut any = false;

    for point in points {
        // Zero or negative closes are feed glitches, not prices.
        if !(point.price.is_finite() && point.price > 0.0) {
            continue;
        }
        if let Some(idx) = timeline.index_of(point.date) {
            values[idx] = point.price;
            any = true;
        }
    }

    if !any {
        return None;
    }
    fill_gaps(&mut values);
    Some(values)
}
