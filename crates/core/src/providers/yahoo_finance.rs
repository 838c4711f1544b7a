use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

use crate::errors::CoreError;
use crate::models::price::{Dividend, PricePoint};
use super::cache::ResponseCache;
use super::traits::PriceProvider;

const PROVIDER: &str = "Yahoo Finance";
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
/// How long a history response is reused for closes and dividends of the same range.
const HISTORY_TTL: Duration = Duration::from_secs(60);

/// Yahoo Finance provider for equity, ETF and mutual fund prices.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Coverage**: Global equities, ETFs, indices, mutual funds, money-market funds.
/// - **Data**: Daily closes and dividend events via `yahoo_finance_api`;
///   the disclosed yield via the quote-summary endpoint. Closes and
///   dividends for one range share a single history request.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
    client: Client,
    history: ResponseCache<yahoo_finance_api::YResponse>,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new().map_err(|e| CoreError::Provider {
            provider: PROVIDER.into(),
            message: format!("Failed to create connector: {e}"),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Ok(Self {
            connector,
            client,
            history: ResponseCache::new(HISTORY_TTL),
        })
    }

    /// Convert a `chrono::NaiveDate` to `time::OffsetDateTime` (midnight UTC).
    fn to_offset_datetime(date: NaiveDate) -> Result<OffsetDateTime, CoreError> {
        let month = u8::try_from(date.month())
            .ok()
            .and_then(|m| time::Month::try_from(m).ok())
            .ok_or_else(|| CoreError::Provider {
                provider: PROVIDER.into(),
                message: format!("Invalid month in {date}"),
            })?;

        let odt = time::Date::from_calendar_date(date.year(), month, date.day() as u8)
            .map_err(|e| CoreError::Provider {
                provider: PROVIDER.into(),
                message: format!("Invalid date {date}: {e}"),
            })?
            .with_hms(0, 0, 0)
            .map_err(|e| CoreError::Provider {
                provider: PROVIDER.into(),
                message: format!("Invalid time for {date}: {e}"),
            })?
            .assume_utc();
        Ok(odt)
    }

    /// Convert a unix timestamp (seconds) to `chrono::NaiveDate`.
    fn timestamp_to_naive_date(ts: i64) -> Option<NaiveDate> {
        chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
    }

    async fn history(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Arc<yahoo_finance_api::YResponse>, CoreError> {
        let key = ResponseCache::<yahoo_finance_api::YResponse>::key(symbol, from, to);
        if let Some(resp) = self.history.get(&key) {
            tracing::debug!(%symbol, %from, %to, "reusing cached Yahoo history");
            return Ok(resp);
        }

        let start = Self::to_offset_datetime(from)?;
        let end = Self::to_offset_datetime(to + chrono::Duration::days(1))?; // inclusive end

        let resp = self
            .connector
            .get_quote_history(symbol, start, end)
            .await
            .map_err(|e| CoreError::Provider {
                provider: PROVIDER.into(),
                message: format!("Failed to fetch history for {symbol}: {e}"),
            })?;
        Ok(self.history.insert(key, resp))
    }
}

// ── Quote-summary response types ────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    summary_detail: Option<SummaryDetail>,
}

#[derive(Deserialize)]
struct SummaryDetail {
    #[serde(rename = "yield")]
    annual_yield: Option<RawValue>,
}

#[derive(Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

#[async_trait]
impl PriceProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn get_price_range(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PricePoint>, CoreError> {
        let resp = self.history(symbol, from, to).await?;

        let quotes = resp.quotes().map_err(|e| CoreError::Provider {
            provider: PROVIDER.into(),
            message: format!("Failed to parse quotes for {symbol}: {e}"),
        })?;

        let mut points: Vec<PricePoint> = quotes
            .iter()
            .filter_map(|q| {
                let date = Self::timestamp_to_naive_date(q.timestamp as i64)?;
                (date >= from && date <= to).then_some(PricePoint {
                    date,
                    price: q.close,
                })
            })
            .collect();

        points.sort_by_key(|p| p.date);
        Ok(points)
    }

    async fn get_dividends(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Dividend>, CoreError> {
        let resp = self.history(symbol, from, to).await?;

        // A response without an events section simply has no dividends.
        let dividends = resp.dividends().unwrap_or_default();

        let mut out: Vec<Dividend> = dividends
            .iter()
            .filter_map(|d| {
                let date = Self::timestamp_to_naive_date(d.date as i64)?;
                (date >= from && date <= to).then_some(Dividend {
                    date,
                    amount: d.amount,
                })
            })
            .collect();

        out.sort_by_key(|d| d.date);
        Ok(out)
    }

    async fn get_annual_yield(&self, symbol: &str) -> Result<f64, CoreError> {
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");
        let resp: QuoteSummaryResponse = self
            .client
            .get(&url)
            .query(&[("modules", "summaryDetail")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Provider {
                provider: PROVIDER.into(),
                message: format!("Failed to parse quote summary for {symbol}: {e}"),
            })?;

        let annual_yield = resp
            .quote_summary
            .result
            .unwrap_or_default()
            .into_iter()
            .find_map(|r| r.summary_detail)
            .and_then(|d| d.annual_yield)
            .and_then(|y| y.raw)
            .unwrap_or(0.0);

        Ok(annual_yield)
    }

    async fn probe(&self, symbol: &str) -> Result<bool, CoreError> {
        let resp = self
            .connector
            .get_quote_range(symbol, "1d", "5d")
            .await
            .map_err(|e| CoreError::Provider {
                provider: PROVIDER.into(),
                message: format!("Failed to probe {symbol}: {e}"),
            })?;

        Ok(resp.quotes().map(|q| !q.is_empty()).unwrap_or(false))
    }
}
