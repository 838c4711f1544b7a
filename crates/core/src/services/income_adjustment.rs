use crate::models::price::{Dividend, IncomeProfile};
use crate::models::timeline::Timeline;

/// Days per year used to turn an annual yield into a daily accrual.
const DAYS_PER_YEAR: f64 = 365.25;

/// Cumulative total-return factor from discrete dividend payments.
///
/// Each payment contributes `ln(1 + dividend / close)` on its pay date; the
/// running sum is exponentiated, so compounding over thousands of days stays
/// in log space. Dividends dated off the timeline are ignored.
pub fn dividend_factors(
    timeline: &Timeline,
    closes: &[f64],
    dividends: &[Dividend],
) -> Vec<f64> {
    let mut paid = vec![0.0_f64; timeline.len()];
    for dividend in dividends {
        if let Some(idx) = timeline.index_of(dividend.date) {
            paid[idx] += dividend.amount;
        }
    }

    let mut cumulative_log: f64 = 0.0;
    paid.iter()
        .zip(closes.iter())
        .map(|(&amount, &close)| {
            if amount != 0.0 {
                let step = (amount / close).ln_1p();
                if step.is_finite() {
                    cumulative_log += step;
                }
            }
            cumulative_log.exp()
        })
        .collect()
}

/// Continuous-compounding factor for an instrument that only discloses an
/// annual yield: `exp(ln(1 + yield) · days_elapsed / 365.25)`.
pub fn yield_factors(timeline: &Timeline, annual_yield: f64) -> Vec<f64> {
    let rate = annual_yield.ln_1p();
    (0..timeline.len())
        .map(|idx| (rate * timeline.days_elapsed(idx) as f64 / DAYS_PER_YEAR).exp())
        .collect()
}

/// Multiply `closes` in place by the factor implied by `income`.
/// `IncomeProfile::None` leaves the closes unchanged.
pub fn apply_income(closes: &mut [f64], timeline: &Timeline, income: &IncomeProfile) {
    let factors = match income {
        IncomeProfile::Dividends(dividends) => dividend_factors(timeline, closes, dividends),
        IncomeProfile::Yield(annual_yield) => yield_factors(timeline, *annual_yield),
        IncomeProfile::None => return,
    };

    for (close, factor) in closes.iter_mut().zip(factors) {
        *close *= factor;
    }
}
