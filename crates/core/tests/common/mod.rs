// ═══════════════════════════════════════════════════════════════════
// Shared test helpers — deterministic mock provider and fixtures
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use normalized_prices_core::errors::CoreError;
use normalized_prices_core::models::price::{Dividend, PricePoint};
use normalized_prices_core::models::settings::{CompositeBasket, PanelSettings};
use normalized_prices_core::models::timeline::Timeline;
use normalized_prices_core::providers::registry::ProviderRegistry;
use normalized_prices_core::providers::traits::PriceProvider;
use normalized_prices_core::services::price_service::PriceService;

pub const TOLERANCE: f64 = 1e-9;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Business days from Mon 2024-01-01 to Fri 2024-03-29 (65 entries).
pub fn test_timeline() -> Timeline {
    Timeline::business_days(date(2024, 1, 1), date(2024, 3, 29)).unwrap()
}

pub fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE * (1.0 + a.abs().max(b.abs()))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        approx_eq(actual, expected),
        "expected {expected}, got {actual}"
    );
}

/// Element-wise equality where two NaNs count as equal.
pub fn series_eq(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(x, y)| (x.is_nan() && y.is_nan()) || approx_eq(*x, *y))
}

/// Closes growing linearly from `start` by `step` per business day of `timeline`.
pub fn linear_points(timeline: &Timeline, start: f64, step: f64) -> Vec<PricePoint> {
    timeline
        .dates()
        .iter()
        .enumerate()
        .map(|(i, d)| PricePoint {
            date: *d,
            price: start + step * i as f64,
        })
        .collect()
}

/// In-memory provider with per-symbol closes, dividends and yields, plus
/// switches to make individual calls fail or stall.
#[derive(Default)]
pub struct MockProvider {
    pub name: String,
    pub closes: HashMap<String, Vec<PricePoint>>,
    pub dividends: HashMap<String, Vec<Dividend>>,
    pub yields: HashMap<String, f64>,
    pub failing_income: HashSet<String>,
    pub failing_dividends: HashSet<String>,
    pub failing_closes: HashSet<String>,
    pub delay: Option<Duration>,
    pub fail_everything: bool,
    /// Behave like a closes-only feed (`reports_income` is false).
    pub no_income_feed: bool,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_closes(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.closes.insert(symbol.to_string(), points);
        self
    }

    pub fn with_linear(self, symbol: &str, timeline: &Timeline, start: f64, step: f64) -> Self {
        let points = linear_points(timeline, start, step);
        self.with_closes(symbol, points)
    }

    pub fn with_dividend(mut self, symbol: &str, date: NaiveDate, amount: f64) -> Self {
        self.dividends
            .entry(symbol.to_string())
            .or_default()
            .push(Dividend { date, amount });
        self
    }

    pub fn with_yield(mut self, symbol: &str, annual_yield: f64) -> Self {
        self.yields.insert(symbol.to_string(), annual_yield);
        self
    }

    pub fn with_failing_income(mut self, symbol: &str) -> Self {
        self.failing_income.insert(symbol.to_string());
        self
    }

    /// Fail only the dividend lookup; the yield still answers.
    pub fn with_failing_dividends(mut self, symbol: &str) -> Self {
        self.failing_dividends.insert(symbol.to_string());
        self
    }

    pub fn without_income_feed(mut self) -> Self {
        self.no_income_feed = true;
        self
    }

    pub fn with_failing_closes(mut self, symbol: &str) -> Self {
        self.failing_closes.insert(symbol.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_everything = true;
        self
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn error(&self, what: &str) -> CoreError {
        CoreError::Provider {
            provider: self.name.clone(),
            message: what.to_string(),
        }
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        self.stall().await;
        if self.fail_everything || self.failing_closes.contains(symbol) {
            return Err(self.error("closes unavailable"));
        }
        Ok(self
            .closes
            .get(symbol)
            .map(|points| {
                points
                    .iter()
                    .filter(|p| p.date >= from && p.date <= to)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_dividends(
        &self,
        symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError> {
        self.stall().await;
        if self.fail_everything
            || self.failing_income.contains(symbol)
            || self.failing_dividends.contains(symbol)
        {
            return Err(self.error("dividends unavailable"));
        }
        Ok(self.dividends.get(symbol).cloned().unwrap_or_default())
    }

    async fn get_annual_yield(&self, symbol: &str) -> Result<f64, CoreError> {
        self.stall().await;
        if self.fail_everything || self.failing_income.contains(symbol) {
            return Err(self.error("yield unavailable"));
        }
        Ok(self.yields.get(symbol).copied().unwrap_or(0.0))
    }

    async fn probe(&self, symbol: &str) -> Result<bool, CoreError> {
        self.stall().await;
        if self.fail_everything {
            return Err(self.error("probe unavailable"));
        }
        Ok(self.closes.contains_key(symbol))
    }

    fn reports_income(&self) -> bool {
        !self.no_income_feed
    }
}

pub fn registry_with(provider: MockProvider) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(provider));
    registry
}

pub fn service_with(provider: MockProvider) -> PriceService {
    PriceService::new(registry_with(provider))
}

/// Mock with four tickers on the test timeline, no income.
pub fn standard_provider(timeline: &Timeline) -> MockProvider {
    MockProvider::new("Mock")
        .with_linear("AAA", timeline, 100.0, 1.0)
        .with_linear("BBB", timeline, 50.0, -0.25)
        .with_linear("CCC", timeline, 20.0, 0.1)
        .with_linear("DDD", timeline, 300.0, 2.0)
}

/// Settings pinned to the test timeline, without a composite.
pub fn test_settings(tickers: &[&str]) -> PanelSettings {
    PanelSettings {
        initial_tickers: symbols(tickers),
        date_start: date(2024, 1, 1),
        date_end: Some(date(2024, 3, 29)),
        initial_interval_days: 30,
        max_tickers: 3,
        composite: None,
        ..PanelSettings::default()
    }
}

pub fn test_basket() -> CompositeBasket {
    CompositeBasket::new("Portfolio", &[("AAA", 0.5), ("DDD", 0.25)])
}
