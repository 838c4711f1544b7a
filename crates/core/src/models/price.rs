use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single closing price (date → price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// A cash dividend paid on `date`, in the same currency as the closes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dividend {
    pub date: NaiveDate,
    pub amount: f64,
}

/// What a ticker pays its holders, as far as the provider can tell.
///
/// Decides how the raw closes are turned into a total-return series:
/// - `Dividends`: discrete payments compounded on their pay dates.
/// - `Yield`: no payment history but a disclosed annual yield (money-market,
///   bond-like funds), compounded continuously.
/// - `None`: closes are used unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IncomeProfile {
    Dividends(Vec<Dividend>),
    Yield(f64),
    None,
}

impl IncomeProfile {
    /// Pick the profile from what the provider returned.
    /// A dividend history always wins over a yield figure.
    pub fn from_parts(dividends: Vec<Dividend>, annual_yield: f64) -> Self {
        if !dividends.is_empty() {
            IncomeProfile::Dividends(dividends)
        } else if annual_yield.is_finite() && annual_yield > 0.0 {
            IncomeProfile::Yield(annual_yield)
        } else {
            IncomeProfile::None
        }
    }
}
