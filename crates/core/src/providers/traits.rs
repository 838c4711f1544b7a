use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::CoreError;
use crate::models::price::{Dividend, PricePoint};

/// Trait abstraction for all market data providers.
///
/// Each API provider (Yahoo Finance, Alpha Vantage) implements this trait.
/// If an API stops working or changes, we replace only that one
/// implementation; the rest of the codebase is untouched.
///
/// Providers return what the remote side has, unaligned and unfilled;
/// `PriceService` maps it onto the session timeline.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Daily closing prices in `[from, to]`, sorted by date.
    async fn get_price_range(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError>;

    /// Cash dividends paid in `[from, to]`, sorted by date. Empty when none.
    async fn get_dividends(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError>;

    /// Disclosed annual yield as a fraction (0.05 = 5%). 0 when unknown.
    async fn get_annual_yield(&self, symbol: &str) -> Result<f64, CoreError>;

    /// Whether the provider has recent data for `symbol`.
    async fn probe(&self, symbol: &str) -> Result<bool, CoreError>;

    /// Whether dividend and yield answers from this provider carry
    /// information. A provider without an income feed returns `false`, and
    /// its empty answers are never read as "pays nothing".
    fn reports_income(&self) -> bool {
        true
    }
}
