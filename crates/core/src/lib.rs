pub mod display;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use models::{
    payload::{PanelPayload, PayloadSeries, TickerInputStatus},
    settings::PanelSettings,
    ticker_set::normalize_ticker_symbol,
    timeline::Timeline,
    window::{DateWindow, DisplayAxes, Lookback, RangePreset},
};
use providers::registry::ProviderRegistry;
use services::{
    price_service::PriceService,
    series_store::PriceSeriesStore,
    window_mapper::{
        date_range_to_index_pair, extract_window_from_display_state, index_pair_to_date_range,
        relative_window,
    },
};
use std::time::Duration;

use errors::CoreError;

/// What a call to `PanelSession::update_view` changed.
#[derive(Debug, Default)]
pub struct ViewUpdate {
    pub tickers_changed: bool,
    pub window_changed: bool,
    /// Tickers that were requested but could not be added.
    pub failed: Vec<(String, CoreError)>,
}

impl ViewUpdate {
    pub fn changed(&self) -> bool {
        self.tickers_changed || self.window_changed
    }
}

/// One client's view of the panel: its ticker set, its window and the
/// series behind them.
///
/// Each connected client owns its own session; nothing is shared between
/// sessions. Calls are expected once per settled interaction (see
/// `display::debounce`), not once per raw input event.
#[must_use]
pub struct PanelSession {
    id: uuid::Uuid,
    settings: PanelSettings,
    price_service: PriceService,
    store: PriceSeriesStore,
    payload: PanelPayload,
    /// Reference day for year-to-date windows.
    today: NaiveDate,
}

impl std::fmt::Debug for PanelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelSession")
            .field("id", &self.id)
            .field("tickers", &self.store.tickers().as_slice())
            .field("composite", &self.store.composite())
            .field("window", &self.window())
            .finish()
    }
}

impl PanelSession {
    /// Open a session backed by the default providers.
    pub async fn open(settings: PanelSettings) -> Result<Self, CoreError> {
        let registry = ProviderRegistry::new_with_defaults(&settings.api_keys);
        Self::open_with_registry(settings, registry).await
    }

    /// Open a session backed by `registry`.
    ///
    /// Builds the timeline, fetches the initial tickers and the composite
    /// basket, and applies the initial relative window. Fails when the
    /// settings are invalid or the initial prices cannot be fetched.
    pub async fn open_with_registry(
        settings: PanelSettings,
        registry: ProviderRegistry,
    ) -> Result<Self, CoreError> {
        settings.validate()?;

        let today = settings.resolved_end();
        let timeline = Timeline::business_days(settings.date_start, today)?;
        let price_service = PriceService::new(registry)
            .with_timeout(Duration::from_secs(settings.provider_timeout_secs));

        let tickers: Vec<String> = settings
            .initial_tickers
            .iter()
            .map(|t| normalize_ticker_symbol(t))
            .filter(|t| !t.is_empty())
            .collect();

        let mut store = PriceSeriesStore::construct(
            &price_service,
            timeline,
            &tickers,
            settings.composite.as_ref(),
            settings.series,
        )
        .await?;

        let initial = relative_window(
            store.timeline(),
            Lookback::Days(settings.initial_interval_days),
            None,
        );
        let idx = date_range_to_index_pair(store.timeline(), &initial);
        store.recompute_window(idx);

        let payload = build_payload(&store);
        let id = uuid::Uuid::new_v4();
        tracing::info!(session = %id, window = ?initial, "panel session opened");

        Ok(Self {
            id,
            settings,
            price_service,
            store,
            payload,
            today,
        })
    }

    // ── Display Requests ────────────────────────────────────────────

    /// Bring the panel in line with the display: reconcile the ticker list
    /// (if it differs) and re-anchor to `window` (if its index pair moved).
    /// Nothing is recomputed when neither changed.
    pub async fn update_view(&mut self, tickers: &[String], window: &DateWindow) -> ViewUpdate {
        let mut update = ViewUpdate::default();

        if tickers != self.store.tickers().as_slice() {
            let result = self.store.update_tickers(&self.price_service, tickers).await;
            update.tickers_changed = result.changed();
            update.failed = result.failed;
            if update.tickers_changed {
                tracing::info!(
                    session = %self.id,
                    tickers = ?self.store.tickers().as_slice(),
                    added = ?result.added,
                    removed = ?result.removed,
                    "tickers update"
                );
            }
        }

        let idx = date_range_to_index_pair(self.store.timeline(), window);
        if idx != self.store.window() {
            self.store.recompute_window(idx);
            update.window_changed = true;
            tracing::info!(session = %self.id, ?window, "interval update");
        }

        if update.changed() {
            self.payload = build_payload(&self.store);
        }
        update
    }

    /// Handle a range button: take the window the display currently shows,
    /// keep its end, and reach back by `preset`.
    pub async fn apply_preset(
        &mut self,
        tickers: &[String],
        preset: RangePreset,
        axes: &DisplayAxes,
    ) -> ViewUpdate {
        let shown = extract_window_from_display_state(axes);
        let window = relative_window(
            self.store.timeline(),
            preset.lookback(self.today),
            Some(&shown),
        );
        self.update_view(tickers, &window).await
    }

    /// Check a ticker typed into the input box against the current list.
    ///
    /// Never fails: every outcome is a status for the display to show.
    /// The caller adds an accepted ticker to its list and calls `update_view`.
    pub async fn submit_ticker(&self, input: &str, current: &[String]) -> TickerInputStatus {
        let ticker = normalize_ticker_symbol(input);
        if ticker.is_empty() {
            return TickerInputStatus::Empty;
        }
        if current.iter().any(|t| *t == ticker) {
            return TickerInputStatus::AlreadyAdded(ticker);
        }
        if !self.is_valid_ticker(&ticker).await {
            return TickerInputStatus::NotValid(ticker);
        }
        if current.len() >= self.settings.max_tickers {
            return TickerInputStatus::LimitReached(self.settings.max_tickers);
        }
        TickerInputStatus::Added(ticker)
    }

    /// Best-effort existence check for `ticker`. Never fails.
    pub async fn is_valid_ticker(&self, ticker: &str) -> bool {
        PriceSeriesStore::is_valid_ticker(&self.price_service, ticker).await
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    pub fn store(&self) -> &PriceSeriesStore {
        &self.store
    }

    pub fn timeline(&self) -> &Timeline {
        self.store.timeline()
    }

    /// The applied window, as dates.
    pub fn window(&self) -> DateWindow {
        index_pair_to_date_range(self.store.timeline(), self.store.window())
    }

    /// The latest display payload.
    pub fn payload(&self) -> &PanelPayload {
        &self.payload
    }
}

/// Snapshot the store into what the display draws: normalized series in
/// percent, rolling returns as fractions, both in column order.
fn build_payload(store: &PriceSeriesStore) -> PanelPayload {
    let normalized = store
        .normalized()
        .iter()
        .map(|(ticker, values)| PayloadSeries {
            ticker: ticker.to_string(),
            values: values.iter().map(|v| 100.0 * v).collect(),
        })
        .collect();

    let rolling = store
        .rolling_returns()
        .iter()
        .map(|(ticker, values)| PayloadSeries {
            ticker: ticker.to_string(),
            values: values.to_vec(),
        })
        .collect();

    PanelPayload {
        dates: store.timeline().dates().to_vec(),
        window: index_pair_to_date_range(store.timeline(), store.window()),
        normalized,
        rolling,
    }
}
