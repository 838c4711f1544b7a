use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::window::DateWindow;

/// One labelled series of the display payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadSeries {
    pub ticker: String,
    /// Aligned with `PanelPayload::dates`. `NaN` (serialized as `null`) marks
    /// points the display must not draw.
    pub values: Vec<f64>,
}

/// Everything the display needs to draw the panel.
///
/// The core computes all the numbers; the frontend only renders.
/// - `normalized`: percent change since the window start, blank outside the window
/// - `rolling`: trailing-year sum of daily returns, for the overview strip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelPayload {
    pub dates: Vec<NaiveDate>,
    pub window: DateWindow,
    pub normalized: Vec<PayloadSeries>,
    pub rolling: Vec<PayloadSeries>,
}

impl PanelPayload {
    /// Column labels, in display order.
    pub fn tickers(&self) -> Vec<&str> {
        self.normalized.iter().map(|s| s.ticker.as_str()).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Outcome of submitting a ticker from the input box, shown inline
/// next to the input instead of raising an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickerInputStatus {
    /// Blank input; nothing to do.
    Empty,
    AlreadyAdded(String),
    NotValid(String),
    LimitReached(usize),
    Added(String),
}

impl TickerInputStatus {
    pub fn is_added(&self) -> bool {
        matches!(self, TickerInputStatus::Added(_))
    }

    /// Short status line for the input placeholder.
    pub fn message(&self) -> String {
        match self {
            TickerInputStatus::Empty => "Enter ticker symbol...".to_string(),
            TickerInputStatus::AlreadyAdded(t) => format!("⚠️ `{t}` already added"),
            TickerInputStatus::NotValid(t) => format!("❌ `{t}` is not valid"),
            TickerInputStatus::LimitReached(max) => format!("⛔ {max} tickers max!"),
            TickerInputStatus::Added(t) => format!("✅ `{t}` added"),
        }
    }
}

impl std::fmt::Display for TickerInputStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}
