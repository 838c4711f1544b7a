use crate::errors::CoreError;
use crate::models::frame::Frame;
use crate::models::settings::{CompositeBasket, SeriesSettings};
use crate::models::ticker_set::{is_well_formed_symbol, TickerSet};
use crate::models::timeline::Timeline;
use crate::models::window::IndexWindow;
use crate::services::income_adjustment::apply_income;
use crate::services::price_service::PriceService;
use crate::services::series_math::{
    growth_index, normalize_window, period_returns, rolling_sum, weighted_sum,
};
use crate::services::window_mapper::full_range;

/// What `PriceSeriesStore::update_tickers` changed.
#[derive(Debug, Default)]
pub struct TickerUpdate {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Tickers that could not be added, with the reason. The rest of the
    /// update still went through.
    pub failed: Vec<(String, CoreError)>,
    pub reordered: bool,
}

impl TickerUpdate {
    pub fn changed(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty() || self.reordered
    }
}

/// Single source of truth for the panel's price series.
///
/// Holds four frames aligned with the timeline, with identical column order:
/// - `raw`: income-adjusted closes (the composite, if any, is column 0)
/// - `normalized`: `raw / raw[window.start] - 1` inside the active window, `NaN` outside
/// - `period_returns`: day-over-day change of the full-history growth index
/// - `rolling_returns`: trailing sum of period returns
///
/// Only `normalized` depends on the window. Ticker mutations touch only the
/// affected column, so adding a ticker costs the same regardless of how
/// many are already shown.
#[derive(Debug)]
pub struct PriceSeriesStore {
    timeline: Timeline,
    settings: SeriesSettings,
    tickers: TickerSet,
    composite: Option<String>,
    raw: Frame,
    normalized: Frame,
    period_returns: Frame,
    rolling_returns: Frame,
    window: IndexWindow,
    /// Bumped on every recomputation of `normalized`.
    normalized_version: u64,
    adjustment_failures: Vec<(String, CoreError)>,
}

impl PriceSeriesStore {
    /// Fetch, adjust and derive every series for `tickers` (plus the
    /// optional composite basket) over the whole timeline.
    ///
    /// Fails when the provider has no data for the set or cannot be reached.
    /// A ticker whose dividend/yield lookup fails keeps its unadjusted closes;
    /// the failure is logged and available from `adjustment_failures`.
    pub async fn construct(
        price_service: &PriceService,
        timeline: Timeline,
        tickers: &[String],
        composite: Option<&CompositeBasket>,
        settings: SeriesSettings,
    ) -> Result<Self, CoreError> {
        let requested = TickerSet::from_symbols(
            tickers
                .iter()
                .filter(|t| composite.map_or(true, |c| c.name != **t))
                .cloned(),
        );

        let mut symbols: Vec<String> = requested.as_slice().to_vec();
        if let Some(basket) = composite {
            for symbol in basket.symbols() {
                if !symbols.iter().any(|s| s == symbol) {
                    symbols.push(symbol.to_string());
                }
            }
        }

        let mut fetched = price_service.fetch_closes(&symbols, &timeline).await?;

        let mut adjustment_failures = Vec::new();
        for label in fetched.labels().to_vec() {
            match price_service.fetch_income(&label, &timeline).await {
                Ok(income) => {
                    if let Some(column) = fetched.column_mut(&label) {
                        apply_income(column, &timeline, &income);
                    }
                }
                Err(e) => {
                    tracing::warn!(ticker = %label, error = %e, "income adjustment failed, using unadjusted closes");
                    adjustment_failures.push((label, e));
                }
            }
        }

        let mut raw = Frame::new(timeline.len());
        let composite_name = match composite {
            Some(basket) => match composite_column(basket, &fetched) {
                Some(values) => {
                    raw.push_column(basket.name.as_str(), values)?;
                    Some(basket.name.clone())
                }
                None => {
                    tracing::warn!(composite = %basket.name, "no basket member has prices, composite omitted");
                    None
                }
            },
            None => None,
        };

        let mut ticker_set = TickerSet::new();
        for ticker in requested.iter() {
            if let Some(values) = fetched.remove_column(ticker) {
                raw.push_column(ticker, values)?;
                ticker_set.push(ticker);
            }
        }

        let window = full_range(&timeline);
        let mut store = Self {
            normalized: Frame::new(timeline.len()),
            period_returns: Frame::new(timeline.len()),
            rolling_returns: Frame::new(timeline.len()),
            timeline,
            settings,
            tickers: ticker_set,
            composite: composite_name,
            raw,
            window,
            normalized_version: 0,
            adjustment_failures,
        };

        for label in store.raw.labels().to_vec() {
            store.derive_column(&label)?;
        }

        tracing::info!(
            tickers = ?store.tickers.as_slice(),
            composite = ?store.composite,
            days = store.timeline.len(),
            "price series store constructed"
        );
        Ok(store)
    }

    // ── Ticker Mutation ─────────────────────────────────────────────

    /// Add `ticker` as the last column. Returns `Ok(false)` when it is
    /// already present.
    ///
    /// Only the new column is computed (against the current window); the
    /// existing columns are untouched. A malformed symbol fails with
    /// `InvalidTicker` before any provider is asked. On failure the store is
    /// unchanged.
    pub async fn add_ticker(
        &mut self,
        price_service: &PriceService,
        ticker: &str,
    ) -> Result<bool, CoreError> {
        if self.tickers.contains(ticker) || self.is_composite(ticker) {
            return Ok(false);
        }
        if !is_well_formed_symbol(ticker) {
            return Err(CoreError::InvalidTicker(ticker.to_string()));
        }

        let mut closes = price_service.fetch_close(ticker, &self.timeline).await?;
        match price_service.fetch_income(ticker, &self.timeline).await {
            Ok(income) => apply_income(&mut closes, &self.timeline, &income),
            Err(e) => {
                tracing::warn!(%ticker, error = %e, "income adjustment failed, using unadjusted closes");
                self.adjustment_failures.push((ticker.to_string(), e));
            }
        }

        self.raw.push_column(ticker, closes)?;
        self.derive_column(ticker)?;
        self.tickers.push(ticker);

        tracing::info!(%ticker, "ticker added");
        Ok(true)
    }

    /// Drop `ticker` from every series. Returns `false` when it is absent.
    /// The composite pseudo-ticker is never removed this way.
    pub fn remove_ticker(&mut self, ticker: &str) -> bool {
        if self.is_composite(ticker) {
            tracing::warn!(%ticker, "composite column cannot be removed");
            return false;
        }
        if self.tickers.remove(ticker).is_none() {
            return false;
        }

        for frame in self.frames_mut() {
            frame.remove_column(ticker);
        }
        self.adjustment_failures.retain(|(t, _)| t != ticker);

        tracing::info!(%ticker, "ticker removed");
        true
    }

    /// Reconcile the ticker set with `tickers`: drop what is gone, add what
    /// is new, then put the columns in the requested order.
    ///
    /// Reordering only moves columns; no value is recomputed. A ticker that
    /// cannot be added is reported in `TickerUpdate::failed` and skipped.
    pub async fn update_tickers(
        &mut self,
        price_service: &PriceService,
        tickers: &[String],
    ) -> TickerUpdate {
        let target = TickerSet::from_symbols(
            tickers.iter().filter(|t| !self.is_composite(t)).cloned(),
        );
        let mut update = TickerUpdate::default();

        let stale: Vec<String> = self
            .tickers
            .iter()
            .filter(|t| !target.contains(t))
            .map(String::from)
            .collect();
        for ticker in stale {
            if self.remove_ticker(&ticker) {
                update.removed.push(ticker);
            }
        }

        for ticker in target.iter() {
            if self.tickers.contains(ticker) {
                continue;
            }
            match self.add_ticker(price_service, ticker).await {
                Ok(true) => update.added.push(ticker.to_string()),
                Ok(false) => {}
                Err(e) => {
                    if e.is_provider_failure() {
                        tracing::warn!(%ticker, error = %e, "could not add ticker");
                    } else {
                        tracing::info!(%ticker, error = %e, "ticker rejected");
                    }
                    update.failed.push((ticker.to_string(), e));
                }
            }
        }

        let order: Vec<String> = target
            .iter()
            .filter(|t| self.tickers.contains(t))
            .map(String::from)
            .collect();
        if order.as_slice() != self.tickers.as_slice() {
            match self.reorder(&order) {
                Ok(()) => update.reordered = true,
                Err(e) => tracing::warn!(error = %e, "could not reorder tickers"),
            }
        }

        update
    }

    /// Put the ticker columns in `order` (a permutation of the current
    /// tickers). The composite stays first.
    pub fn reorder(&mut self, order: &[String]) -> Result<(), CoreError> {
        let new_set = TickerSet::from_symbols(order.iter().cloned());
        if new_set.len() != order.len() || !self.tickers.same_members(&new_set) {
            return Err(CoreError::ValidationError(format!(
                "{} is not a permutation of {}",
                order.join(", "),
                self.tickers.as_slice().join(", ")
            )));
        }

        let mut labels: Vec<String> = self.composite.iter().cloned().collect();
        labels.extend(order.iter().cloned());
        for frame in self.frames_mut() {
            frame.reorder(&labels)?;
        }
        self.tickers = new_set;
        Ok(())
    }

    /// Best-effort existence check, for validating user input before
    /// `add_ticker`. Never fails; any provider problem means `false`.
    pub async fn is_valid_ticker(price_service: &PriceService, ticker: &str) -> bool {
        price_service.probe_exists(ticker).await
    }

    // ── Window ──────────────────────────────────────────────────────

    /// Re-anchor the normalized series to `window` and return it.
    ///
    /// Asking for the window already applied returns the cached frame
    /// without recomputation (`normalized_version` stays the same). Period
    /// and rolling returns never depend on the window and are left alone.
    pub fn recompute_window(&mut self, window: IndexWindow) -> &Frame {
        let last = self.timeline.last_index();
        let window = IndexWindow::new(window.start.min(last), window.end.min(last));

        if window == self.window {
            tracing::debug!(?window, "window unchanged, reusing normalized series");
            return &self.normalized;
        }

        let mut normalized = Frame::new(self.timeline.len());
        for (label, column) in self.raw.iter() {
            if let Err(e) = normalized.set_column(label, normalize_window(column, window)) {
                tracing::warn!(ticker = %label, error = %e, "normalized column skipped");
            }
        }
        self.normalized = normalized;
        self.window = window;
        self.normalized_version += 1;

        tracing::debug!(?window, version = self.normalized_version, "normalized series recomputed");
        &self.normalized
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// User tickers in display order (the composite is not included).
    pub fn tickers(&self) -> &TickerSet {
        &self.tickers
    }

    /// Label of the composite column, if one is shown.
    pub fn composite(&self) -> Option<&str> {
        self.composite.as_deref()
    }

    /// All column labels in display order, composite first.
    pub fn columns(&self) -> &[String] {
        self.raw.labels()
    }

    pub fn raw(&self) -> &Frame {
        &self.raw
    }

    pub fn normalized(&self) -> &Frame {
        &self.normalized
    }

    pub fn period_returns(&self) -> &Frame {
        &self.period_returns
    }

    pub fn rolling_returns(&self) -> &Frame {
        &self.rolling_returns
    }

    /// The last-applied window.
    pub fn window(&self) -> IndexWindow {
        self.window
    }

    pub fn normalized_version(&self) -> u64 {
        self.normalized_version
    }

    /// Tickers currently shown with unadjusted closes, and why.
    pub fn adjustment_failures(&self) -> &[(String, CoreError)] {
        &self.adjustment_failures
    }

    // ── Internal ────────────────────────────────────────────────────

    fn is_composite(&self, ticker: &str) -> bool {
        self.composite.as_deref() == Some(ticker)
    }

    fn frames_mut(&mut self) -> [&mut Frame; 4] {
        [
            &mut self.raw,
            &mut self.normalized,
            &mut self.period_returns,
            &mut self.rolling_returns,
        ]
    }

    /// Compute the three derived columns for `label` from its raw column.
    fn derive_column(&mut self, label: &str) -> Result<(), CoreError> {
        let raw = self
            .raw
            .column(label)
            .ok_or_else(|| CoreError::ValidationError(format!("no raw column for {label}")))?;

        let normalized = normalize_window(raw, self.window);
        let period = period_returns(&growth_index(raw), self.settings.eps);
        let rolling = rolling_sum(
            &period,
            self.settings.rolling_window,
            self.settings.rolling_min_periods,
        );

        self.normalized.set_column(label, normalized)?;
        self.period_returns.set_column(label, period)?;
        self.rolling_returns.set_column(label, rolling)?;
        Ok(())
    }
}

/// Weighted sum of the basket members present in `closes`.
fn composite_column(basket: &CompositeBasket, closes: &Frame) -> Option<Vec<f64>> {
    let mut parts: Vec<(&[f64], f64)> = Vec::new();
    for member in &basket.members {
        match closes.column(&member.symbol) {
            Some(column) => parts.push((column, member.weight)),
            None => {
                tracing::warn!(composite = %basket.name, symbol = %member.symbol, "basket member has no prices, skipped");
            }
        }
    }

    if parts.is_empty() {
        return None;
    }
    Some(weighted_sum(&parts, closes.rows()))
}
