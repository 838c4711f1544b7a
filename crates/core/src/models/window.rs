use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// A display range in calendar dates. Either side may be unset, which means
/// "no explicit window": the full timeline is shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// The "full range" sentinel.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn is_full(&self) -> bool {
        self.start.is_none() || self.end.is_none()
    }
}

/// A display range as inclusive indices into the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexWindow {
    pub start: usize,
    pub end: usize,
}

impl IndexWindow {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx >= self.start && idx <= self.end
    }
}

/// How far back a relative window reaches from its end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookback {
    /// A fixed number of calendar days.
    Days(i64),
    /// From January 1 of the given year.
    YearToDate { year: i32 },
}

/// The named range buttons offered by the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangePreset {
    Ytd,
    OneMonth,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FiveYears,
    TenYears,
}

impl RangePreset {
    pub const ALL: [RangePreset; 8] = [
        RangePreset::Ytd,
        RangePreset::OneMonth,
        RangePreset::SixMonths,
        RangePreset::OneYear,
        RangePreset::TwoYears,
        RangePreset::ThreeYears,
        RangePreset::FiveYears,
        RangePreset::TenYears,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RangePreset::Ytd => "ytd",
            RangePreset::OneMonth => "1mo",
            RangePreset::SixMonths => "6mo",
            RangePreset::OneYear => "1y",
            RangePreset::TwoYears => "2y",
            RangePreset::ThreeYears => "3y",
            RangePreset::FiveYears => "5y",
            RangePreset::TenYears => "10y",
        }
    }

    /// Calendar-day offset; `None` for year-to-date, which has no fixed length.
    pub fn offset_days(&self) -> Option<i64> {
        match self {
            RangePreset::Ytd => None,
            RangePreset::OneMonth => Some(30),
            RangePreset::SixMonths => Some(182),
            RangePreset::OneYear => Some(365),
            RangePreset::TwoYears => Some(2 * 365),
            RangePreset::ThreeYears => Some(3 * 365),
            RangePreset::FiveYears => Some(5 * 365),
            RangePreset::TenYears => Some(10 * 365),
        }
    }

    /// Resolve to a `Lookback`, using `today` for the year-to-date case.
    pub fn lookback(&self, today: NaiveDate) -> Lookback {
        match self.offset_days() {
            Some(days) => Lookback::Days(days),
            None => Lookback::YearToDate { year: today.year() },
        }
    }
}

impl std::fmt::Display for RangePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for RangePreset {
    type Err = CoreError;

    /// Accepts the label (`"6mo"`) or the button id (`"btn-6mo"`), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let label = lower.strip_prefix("btn-").unwrap_or(&lower);
        RangePreset::ALL
            .into_iter()
            .find(|p| p.label() == label)
            .ok_or_else(|| CoreError::ValidationError(format!("Unknown range preset '{s}'")))
    }
}

/// One x-axis of the rendered chart, as reported back by the display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisState {
    /// `[from, to]` as the display reports it: date strings, possibly with a
    /// time component (`"2023-01-05 12:00:00.0"`).
    #[serde(default)]
    pub range: Option<Vec<serde_json::Value>>,
}

impl AxisState {
    pub fn with_range(from: &str, to: &str) -> Self {
        Self {
            range: Some(vec![from.into(), to.into()]),
        }
    }

    /// The axis range as dates, if it is set and both ends parse.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match self.range.as_deref() {
            Some([from, to]) => Some((parse_axis_date(from)?, parse_axis_date(to)?)),
            _ => None,
        }
    }
}

/// The display's axis layout: the zoomed main axis and the full-range
/// overview axis underneath it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayAxes {
    #[serde(rename = "xaxis2", default)]
    pub zoomed: Option<AxisState>,
    #[serde(rename = "xaxis1", default)]
    pub full: Option<AxisState>,
}

impl DisplayAxes {
    /// Parse the axis part of a display layout JSON object. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn parse_axis_date(value: &serde_json::Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
