use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Ordered business-day dates spanning the configured history.
///
/// Built once per session and never mutated. Strictly increasing, one entry
/// per weekday (holidays included: the provider fills them from neighbours).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    dates: Vec<NaiveDate>,
}

impl Timeline {
    /// All weekdays in `[start, end]`, inclusive on both ends.
    pub fn business_days(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidTimeline(format!(
                "start date ({start}) is after end date ({end})"
            )));
        }

        let dates: Vec<NaiveDate> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .collect();

        Self::from_dates(dates)
    }

    /// Wrap an explicit date list. Rejects empty, unsorted or duplicated input.
    pub fn from_dates(dates: Vec<NaiveDate>) -> Result<Self, CoreError> {
        if dates.is_empty() {
            return Err(CoreError::InvalidTimeline(
                "timeline contains no business days".into(),
            ));
        }
        if let Some(pair) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CoreError::InvalidTimeline(format!(
                "dates must be strictly increasing ({} is followed by {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self { dates })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a constructed timeline; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn get(&self, idx: usize) -> Option<NaiveDate> {
        self.dates.get(idx).copied()
    }

    pub fn first(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    pub fn last_index(&self) -> usize {
        self.dates.len() - 1
    }

    /// Exact position of `date`, if it is a timeline entry.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Index of the entry closest to `date`. Equidistant candidates resolve
    /// to the earlier index (e.g. a Saturday snaps to Friday, not Monday).
    pub fn nearest_index(&self, date: NaiveDate) -> usize {
        match self.dates.binary_search(&date) {
            Ok(idx) => idx,
            Err(0) => 0,
            Err(pos) if pos == self.dates.len() => pos - 1,
            Err(pos) => {
                let before = (date - self.dates[pos - 1]).num_days();
                let after = (self.dates[pos] - date).num_days();
                if after < before {
                    pos
                } else {
                    pos - 1
                }
            }
        }
    }

    /// Calendar days between the first entry and entry `idx`.
    pub fn days_elapsed(&self, idx: usize) -> i64 {
        (self.dates[idx] - self.dates[0]).num_days()
    }
}
