//! Column-level numeric routines shared by the series store.
//!
//! Every function works on one timeline-aligned column and treats `NaN` as
//! "no observation".

use crate::models::window::IndexWindow;

/// Fill gaps in place: each `NaN` takes the next known value (back-fill),
/// then any trailing `NaN` takes the last known value (forward-fill).
/// A column with no known value is left untouched.
pub fn fill_gaps(values: &mut [f64]) {
    let mut next = f64::NAN;
    for v in values.iter_mut().rev() {
        if v.is_nan() {
            *v = next;
        } else {
            next = *v;
        }
    }

    let mut prev = f64::NAN;
    for v in values.iter_mut() {
        if v.is_nan() {
            *v = prev;
        } else {
            prev = *v;
        }
    }
}

/// Rebase `raw` to 0 at `window.start`: `raw / raw[start] - 1` inside the
/// window, `NaN` outside it (so the display leaves those points blank).
///
/// If the anchor value is missing or zero the whole column is `NaN`.
pub fn normalize_window(raw: &[f64], window: IndexWindow) -> Vec<f64> {
    let mut out = vec![f64::NAN; raw.len()];
    let anchor = match raw.get(window.start) {
        Some(&a) if a.is_finite() && a != 0.0 => a,
        _ => return out,
    };

    let end = window.end.min(raw.len().saturating_sub(1));
    for idx in window.start..=end {
        out[idx] = raw[idx] / anchor - 1.0;
    }
    out
}

/// Growth of one unit held since the first observation: `raw / raw[0]`.
pub fn growth_index(raw: &[f64]) -> Vec<f64> {
    match raw.first() {
        Some(&first) if first.is_finite() && first != 0.0 => {
            raw.iter().map(|v| v / first).collect()
        }
        _ => vec![f64::NAN; raw.len()],
    }
}

/// Day-over-day relative change: `s[i] / (s[i-1] + eps) - 1`.
/// The first observation, and any step without two known values, is 0.
pub fn period_returns(series: &[f64], eps: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(series.len());
    for (idx, value) in series.iter().enumerate() {
        let change = if idx == 0 {
            0.0
        } else {
            value / (series[idx - 1] + eps) - 1.0
        };
        out.push(if change.is_nan() { 0.0 } else { change });
    }
    out
}

/// Trailing sum over `window` observations.
///
/// The first `window - 1` positions use whatever history exists (an
/// expanding window). A position is `NaN` when fewer than `min_periods`
/// known values fall inside its window.
pub fn rolling_sum(values: &[f64], window: usize, min_periods: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(values.len());
    let mut sum: f64 = 0.0;
    let mut count = 0usize;

    for (idx, &value) in values.iter().enumerate() {
        if !value.is_nan() {
            sum += value;
            count += 1;
        }
        if idx >= window {
            let leaving = values[idx - window];
            if !leaving.is_nan() {
                sum -= leaving;
                count -= 1;
            }
        }
        out.push(if count >= min_periods.max(1) { sum } else { f64::NAN });
    }
    out
}

/// `Σ weight · column`, row by row. All columns must have `rows` entries.
pub fn weighted_sum(columns: &[(&[f64], f64)], rows: usize) -> Vec<f64> {
    let mut out = vec![0.0; rows];
    for (column, weight) in columns {
        for (acc, value) in out.iter_mut().zip(column.iter()) {
            *acc += weight * value;
        }
    }
    out
}
