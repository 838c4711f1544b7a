use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::price::{Dividend, PricePoint};
use super::traits::PriceProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER: &str = "Alpha Vantage";

/// Alpha Vantage API provider, used as a fallback source of daily closes.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (set via settings as "alphavantage").
/// - **Coverage**: 100k+ global equity symbols.
///
/// The free daily series carries no dividend column, so this provider never
/// reports income; tickers served only by it are shown as price-only series.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, api_key }
    }

    /// Fetch the full daily time series for a symbol.
    async fn fetch_daily_series(
        &self,
        symbol: &str,
    ) -> Result<HashMap<String, DailyData>, CoreError> {
        let resp: TimeSeriesResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", &symbol.to_uppercase()),
                ("outputsize", "full"),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Provider {
                provider: PROVIDER.into(),
                message: format!("Failed to parse time series for {symbol}: {e}"),
            })?;

        resp.time_series.ok_or_else(|| CoreError::Provider {
            provider: PROVIDER.into(),
            message: format!("No time series data for {symbol}. API limit may be exceeded."),
        })
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "Time Series (Daily)")]
    time_series: Option<HashMap<String, DailyData>>,
}

#[derive(Deserialize)]
struct DailyData {
    #[serde(rename = "4. close")]
    close: String,
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let time_series = self.fetch_daily_series(symbol).await?;

        let mut points: Vec<PricePoint> = time_series
            .iter()
            .filter_map(|(date_str, data)| {
                let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
                if date >= from && date <= to {
                    let price: f64 = data.close.parse().ok()?;
                    Some(PricePoint { date, price })
                } else {
                    None
                }
            })
            .collect();

        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    async fn get_dividends(
        &self,
        _symbol: &str,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError> {
        Ok(Vec::new())
    }

    async fn get_annual_yield(&self, _symbol: &str) -> Result<f64, CoreError> {
        Ok(0.0)
    }

    async fn probe(&self, symbol: &str) -> Result<bool, CoreError> {
        Ok(!self.fetch_daily_series(symbol).await?.is_empty())
    }

    fn reports_income(&self) -> bool {
        false
    }
}
