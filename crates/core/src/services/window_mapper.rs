//! Stateless conversion between calendar-date windows, as the display
//! reports them, and index windows into the session timeline.

use chrono::{Duration, NaiveDate};

use crate::models::timeline::Timeline;
use crate::models::window::{DateWindow, DisplayAxes, IndexWindow, Lookback};

/// The index window covering the whole timeline.
pub fn full_range(timeline: &Timeline) -> IndexWindow {
    IndexWindow::new(0, timeline.last_index())
}

/// Map a date window onto timeline indices.
///
/// Either end unset yields the full range. Each date snaps independently to
/// its nearest timeline entry, ties going to the earlier entry, so a window
/// landing on a weekend or holiday still resolves. Order is not enforced:
/// callers pass `[older, newer]`.
pub fn date_range_to_index_pair(timeline: &Timeline, window: &DateWindow) -> IndexWindow {
    match (window.start, window.end) {
        (Some(start), Some(end)) => {
            IndexWindow::new(timeline.nearest_index(start), timeline.nearest_index(end))
        }
        _ => full_range(timeline),
    }
}

/// The dates at both ends of an index window.
pub fn index_pair_to_date_range(timeline: &Timeline, window: IndexWindow) -> DateWindow {
    DateWindow {
        start: timeline.get(window.start),
        end: timeline.get(window.end),
    }
}

/// A window ending where `anchor` ends (or on the last timeline day) and
/// reaching back by `lookback`, never before the first timeline day.
pub fn relative_window(
    timeline: &Timeline,
    lookback: Lookback,
    anchor: Option<&DateWindow>,
) -> DateWindow {
    let end = anchor.and_then(|w| w.end).unwrap_or_else(|| timeline.last());

    let start = match lookback {
        // A lookback past the representable calendar reaches the first day.
        Lookback::Days(days) => Duration::try_days(days.max(0))
            .and_then(|span| end.checked_sub_signed(span))
            .unwrap_or_else(|| timeline.first()),
        Lookback::YearToDate { year } => {
            NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_else(|| timeline.first())
        }
    };
    let start = start.max(timeline.first()).min(end);

    DateWindow::new(start, end)
}

/// The window the display is currently showing.
///
/// Prefers the zoomed axis, then the full-range axis; with neither set the
/// result is the "full range" sentinel.
pub fn extract_window_from_display_state(axes: &DisplayAxes) -> DateWindow {
    let zoomed = axes.zoomed.as_ref().and_then(|a| a.date_range());
    let full = axes.full.as_ref().and_then(|a| a.date_range());

    match zoomed.or(full) {
        Some((start, end)) => DateWindow::new(start, end),
        None => DateWindow::full(),
    }
}
