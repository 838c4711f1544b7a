use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

/// Longest initial window accepted, in calendar days (100 years).
pub const MAX_INTERVAL_DAYS: i64 = 36_525;

/// One member of the composite basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasketWeight {
    pub symbol: String,
    pub weight: f64,
}

/// A fixed basket of tickers rendered as a single pseudo-ticker.
///
/// Its raw series is the weighted sum of the members' adjusted closes. The
/// basket is independent of the active ticker set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeBasket {
    /// Column label of the pseudo-ticker (e.g., "Portfolio").
    pub name: String,
    pub members: Vec<BasketWeight>,
}

impl CompositeBasket {
    pub fn new(name: impl Into<String>, members: &[(&str, f64)]) -> Self {
        Self {
            name: name.into(),
            members: members
                .iter()
                .map(|(symbol, weight)| BasketWeight {
                    symbol: symbol.to_string(),
                    weight: *weight,
                })
                .collect(),
        }
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.symbol.as_str())
    }

    pub fn total_weight(&self) -> f64 {
        self.members.iter().map(|m| m.weight).sum()
    }
}

impl Default for CompositeBasket {
    fn default() -> Self {
        Self::new(
            "Portfolio",
            &[
                ("SPLG", 0.01),
                ("IEFA", 0.01),
                ("JCBUX", 0.2),
                ("LGBNX", 0.2),
                ("MWTSX", 0.2),
                ("HGIFX", 0.2),
                ("JPPEX", 0.1),
                ("TROIX", 0.1),
                ("PHYQX", 0.01),
                ("CGMXX", 0.01),
                ("MEMJX", 0.01),
                ("DFSTX", 0.01),
                ("PFORX", 0.01),
                ("DFISX", 0.01),
                ("MEDHX", 0.01),
            ],
        )
    }
}

/// Tuning of the derived return series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesSettings {
    /// Trailing window of the rolling return, in trading days (≈ 1 year).
    pub rolling_window: usize,

    /// Observations required before a rolling value is defined.
    /// 1 means an expanding window at the start of the series.
    pub rolling_min_periods: usize,

    /// Added to the period-return denominator so a zero never divides.
    pub eps: f64,
}

impl Default for SeriesSettings {
    fn default() -> Self {
        Self {
            rolling_window: 251,
            rolling_min_periods: 1,
            eps: 1e-6,
        }
    }
}

/// Session configuration. Everything has a default; deserialize a partial
/// JSON object to override selected fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    /// Tickers shown when a session opens.
    pub initial_tickers: Vec<String>,

    /// First day of the timeline.
    pub date_start: NaiveDate,

    /// Last day of the timeline; `None` means today (UTC).
    pub date_end: Option<NaiveDate>,

    /// Length of the window shown when a session opens, in calendar days.
    pub initial_interval_days: i64,

    /// Upper bound on the number of user tickers.
    pub max_tickers: usize,

    #[serde(flatten)]
    pub series: SeriesSettings,

    /// Bound on every provider call, in seconds.
    pub provider_timeout_secs: u64,

    /// Optional composite pseudo-ticker, rendered as the first column.
    pub composite: Option<CompositeBasket>,

    /// Optional API keys for providers that require them
    /// (provider name → key, e.g., "alphavantage").
    pub api_keys: HashMap<String, String>,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            initial_tickers: ["QQQ", "SPY", "VTI", "VT"]
                .into_iter()
                .map(String::from)
                .collect(),
            date_start: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            date_end: None,
            initial_interval_days: 365,
            max_tickers: 24,
            series: SeriesSettings::default(),
            provider_timeout_secs: 30,
            composite: Some(CompositeBasket::default()),
            api_keys: HashMap::new(),
        }
    }
}

impl PanelSettings {
    /// Parse settings from JSON, filling omitted fields with defaults, and validate them.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let settings: PanelSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// The last timeline day: `date_end`, or today.
    pub fn resolved_end(&self) -> NaiveDate {
        self.date_end
            .unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.series.rolling_window == 0 {
            return Err(CoreError::Config("rolling_window must be at least 1".into()));
        }
        if self.series.rolling_min_periods > self.series.rolling_window {
            return Err(CoreError::Config(format!(
                "rolling_min_periods ({}) exceeds rolling_window ({})",
                self.series.rolling_min_periods, self.series.rolling_window
            )));
        }
        if !(self.series.eps.is_finite() && self.series.eps > 0.0) {
            return Err(CoreError::Config(format!(
                "eps must be a positive number, got {}",
                self.series.eps
            )));
        }
        if self.max_tickers == 0 {
            return Err(CoreError::Config("max_tickers must be at least 1".into()));
        }
        if self.provider_timeout_secs == 0 {
            return Err(CoreError::Config(
                "provider_timeout_secs must be at least 1".into(),
            ));
        }
        if !(1..=MAX_INTERVAL_DAYS).contains(&self.initial_interval_days) {
            return Err(CoreError::Config(format!(
                "initial_interval_days must be between 1 and {MAX_INTERVAL_DAYS}, got {}",
                self.initial_interval_days
            )));
        }
        if let Some(end) = self.date_end {
            if end < self.date_start {
                return Err(CoreError::Config(format!(
                    "date_end ({end}) is before date_start ({})",
                    self.date_start
                )));
            }
        }
        if let Some(basket) = &self.composite {
            if basket.members.is_empty() {
                return Err(CoreError::Config(format!(
                    "composite {} has no members",
                    basket.name
                )));
            }
            if let Some(m) = basket
                .members
                .iter()
                .find(|m| !(m.weight.is_finite() && m.weight >= 0.0))
            {
                return Err(CoreError::Config(format!(
                    "composite weight for {} must be non-negative, got {}",
                    m.symbol, m.weight
                )));
            }
            // Over-allocated baskets are still rendered; the sum is only reported.
            if basket.total_weight() > 1.0 + 1e-9 {
                tracing::warn!(
                    composite = %basket.name,
                    total_weight = basket.total_weight(),
                    "composite weights sum above 1"
                );
            }
        }
        Ok(())
    }
}
