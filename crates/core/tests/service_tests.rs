// ═══════════════════════════════════════════════════════════════════
// Series Store Tests — construction, ticker mutation, window recompute
// ═══════════════════════════════════════════════════════════════════

mod common;

use common::{
    assert_close, date, series_eq, service_with, standard_provider, symbols, test_basket,
    test_timeline,
};
use normalized_prices_core::errors::CoreError;
use normalized_prices_core::models::settings::SeriesSettings;
use normalized_prices_core::models::window::IndexWindow;
use normalized_prices_core::services::price_service::PriceService;
use normalized_prices_core::services::series_store::PriceSeriesStore;

async fn store_for(service: &PriceService, tickers: &[&str]) -> PriceSeriesStore {
    PriceSeriesStore::construct(
        service,
        test_timeline(),
        &symbols(tickers),
        None,
        SeriesSettings::default(),
    )
    .await
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// Construction
// ═══════════════════════════════════════════════════════════════════

mod construction {
    use super::*;

    #[tokio::test]
    async fn columns_follow_requested_order() {
        let service = service_with(standard_provider(&test_timeline()));
        let store = store_for(&service, &["BBB", "AAA"]).await;
        assert_eq!(store.columns(), &symbols(&["BBB", "AAA"])[..]);
        assert_eq!(store.tickers().as_slice(), &symbols(&["BBB", "AAA"])[..]);
        for frame in [
            store.raw(),
            store.normalized(),
            store.period_returns(),
            store.rolling_returns(),
        ] {
            assert_eq!(frame.labels(), store.columns());
            assert_eq!(frame.rows(), 65);
        }
    }

    #[tokio::test]
    async fn starts_on_full_window() {
        let service = service_with(standard_provider(&test_timeline()));
        let store = store_for(&service, &["AAA"]).await;
        assert_eq!(store.window(), IndexWindow::new(0, 64));
        assert_eq!(store.normalized_version(), 0);
        assert_eq!(store.normalized().value(0, "AAA"), Some(0.0));
        assert_close(store.normalized().value(64, "AAA").unwrap(), 0.64);
    }

    #[tokio::test]
    async fn period_and_rolling_returns() {
        let service = service_with(standard_provider(&test_timeline()));
        let store = store_for(&service, &["AAA"]).await;
        let period = store.period_returns().column("AAA").unwrap();
        assert_eq!(period[0], 0.0);
        assert_close(period[1], 1.01 / (1.0 + 1e-6) - 1.0);

        // The timeline is shorter than the rolling window, so the rolling
        // return is the running sum of period returns.
        let rolling = store.rolling_returns().column("AAA").unwrap();
        let running: f64 = period.iter().sum();
        assert_close(rolling[64], running);
        assert_eq!(rolling[0], 0.0);
    }

    #[tokio::test]
    async fn short_rolling_window_slides() {
        let service = service_with(standard_provider(&test_timeline()));
        let settings = SeriesSettings {
            rolling_window: 5,
            ..SeriesSettings::default()
        };
        let store = PriceSeriesStore::construct(
            &service,
            test_timeline(),
            &symbols(&["AAA"]),
            None,
            settings,
        )
        .await
        .unwrap();
        let period = store.period_returns().column("AAA").unwrap();
        let rolling = store.rolling_returns().column("AAA").unwrap();
        assert_close(rolling[10], period[6..=10].iter().sum());
    }

    #[tokio::test]
    async fn unknown_tickers_are_dropped() {
        let service = service_with(standard_provider(&test_timeline()));
        let store = store_for(&service, &["AAA", "NOPE"]).await;
        assert_eq!(store.tickers().as_slice(), &symbols(&["AAA"])[..]);
    }

    #[tokio::test]
    async fn no_data_fails() {
        let service = service_with(standard_provider(&test_timeline()));
        let err = PriceSeriesStore::construct(
            &service,
            test_timeline(),
            &symbols(&["NOPE"]),
            None,
            SeriesSettings::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CoreError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn dividends_adjust_raw_closes() {
        let tl = test_timeline();
        let pay = tl.get(10).unwrap();
        let service = service_with(standard_provider(&tl).with_dividend("CCC", pay, 0.3));
        let store = store_for(&service, &["CCC"]).await;
        let raw = store.raw().column("CCC").unwrap();
        assert_close(raw[9], 20.9);
        // Close on the pay date is 21.0, so the factor is 1 + 0.3 / 21.
        assert_close(raw[10], 21.0 * (1.0 + 0.3 / 21.0));
    }

    #[tokio::test]
    async fn income_failure_keeps_unadjusted_closes() {
        let tl = test_timeline();
        let service = service_with(standard_provider(&tl).with_failing_income("BBB"));
        let store = store_for(&service, &["AAA", "BBB"]).await;
        assert_eq!(store.tickers().len(), 2);
        assert_eq!(store.raw().value(0, "BBB"), Some(50.0));
        let failed: Vec<&str> = store
            .adjustment_failures()
            .iter()
            .map(|(t, _)| t.as_str())
            .collect();
        assert_eq!(failed, vec!["BBB"]);
    }
}

mod income_failures {
    use super::*;
    use crate::common::MockProvider;
    use normalized_prices_core::providers::registry::ProviderRegistry;

    #[tokio::test]
    async fn failed_dividends_with_fallback_leave_closes_unadjusted() {
        let tl = test_timeline();
        let mut registry = ProviderRegistry::new();
        registry.register(Box::new(
            standard_provider(&tl)
                .with_failing_dividends("AAA")
                .with_yield("AAA", 0.013),
        ));
        registry.register(Box::new(MockProvider::new("Fallback")));
        let service = PriceService::new(registry);

        let store = store_for(&service, &["AAA"]).await;
        assert_eq!(store.raw().value(64, "AAA"), Some(164.0));
        assert_eq!(store.adjustment_failures().len(), 1);
        assert_eq!(store.adjustment_failures()[0].0, "AAA");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Composite
// ═══════════════════════════════════════════════════════════════════

mod composite {
    use super::*;

    async fn composite_store(service: &PriceService, tickers: &[&str]) -> PriceSeriesStore {
        PriceSeriesStore::construct(
            service,
            test_timeline(),
            &symbols(tickers),
            Some(&test_basket()),
            SeriesSettings::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn composite_is_first_column() {
        let service = service_with(standard_provider(&test_timeline()));
        let store = composite_store(&service, &["BBB"]).await;
        assert_eq!(store.columns(), &symbols(&["Portfolio", "BBB"])[..]);
        assert_eq!(store.composite(), Some("Portfolio"));
        // Basket members are not user tickers.
        assert_eq!(store.tickers().as_slice(), &symbols(&["BBB"])[..]);
    }

    #[tokio::test]
    async fn composite_is_weighted_sum() {
        let service = service_with(standard_provider(&test_timeline()));
        let store = composite_store(&service, &["BBB"]).await;
        let raw = store.raw().column("Portfolio").unwrap();
        assert_close(raw[0], 0.5 * 100.0 + 0.25 * 300.0);
        assert_close(raw[64], 0.5 * 164.0 + 0.25 * 428.0);
    }

    #[tokio::test]
    async fn basket_member_can_also_be_a_ticker() {
        let service = service_with(standard_provider(&test_timeline()));
        let store = composite_store(&service, &["AAA"]).await;
        assert_eq!(store.columns(), &symbols(&["Portfolio", "AAA"])[..]);
        assert_eq!(store.raw().value(0, "AAA"), Some(100.0));
    }

    #[tokio::test]
    async fn composite_cannot_be_removed_or_added() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = composite_store(&service, &["BBB"]).await;
        assert!(!store.remove_ticker("Portfolio"));
        assert!(!store.add_ticker(&service, "Portfolio").await.unwrap());
        assert_eq!(store.columns().len(), 2);
    }

    #[tokio::test]
    async fn composite_stays_first_after_updates() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = composite_store(&service, &["BBB"]).await;
        store
            .update_tickers(&service, &symbols(&["CCC", "Portfolio", "BBB"]))
            .await;
        assert_eq!(store.columns(), &symbols(&["Portfolio", "CCC", "BBB"])[..]);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Ticker mutation
// ═══════════════════════════════════════════════════════════════════

mod mutation {
    use super::*;

    #[tokio::test]
    async fn add_then_remove_restores_state() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        let raw = store.raw().clone();
        let normalized = store.normalized().clone();
        let period = store.period_returns().clone();
        let rolling = store.rolling_returns().clone();

        assert!(store.add_ticker(&service, "BBB").await.unwrap());
        assert_eq!(store.columns(), &symbols(&["AAA", "BBB"])[..]);
        assert!(store.remove_ticker("BBB"));

        assert_eq!(store.raw(), &raw);
        assert_eq!(store.normalized(), &normalized);
        assert_eq!(store.period_returns(), &period);
        assert_eq!(store.rolling_returns(), &rolling);
    }

    #[tokio::test]
    async fn add_existing_is_noop() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        assert!(!store.add_ticker(&service, "AAA").await.unwrap());
        assert_eq!(store.columns().len(), 1);
    }

    #[tokio::test]
    async fn add_unknown_fails_and_leaves_store_alone() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        let err = store.add_ticker(&service, "NOPE").await.unwrap_err();
        assert!(matches!(err, CoreError::DataUnavailable(_)));
        assert_eq!(store.columns(), &symbols(&["AAA"])[..]);
    }

    #[tokio::test]
    async fn add_malformed_symbol_is_invalid_ticker() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        let err = store.add_ticker(&service, "A B").await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidTicker(ref t) if t == "A B"));
        assert!(!err.is_provider_failure());
        assert_eq!(store.columns(), &symbols(&["AAA"])[..]);
    }

    #[tokio::test]
    async fn update_reports_malformed_symbol_as_invalid() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        let update = store
            .update_tickers(&service, &symbols(&["AAA", "A B", "CCC"]))
            .await;
        assert_eq!(update.added, symbols(&["CCC"]));
        assert_eq!(update.failed.len(), 1);
        assert_eq!(update.failed[0].0, "A B");
        assert!(matches!(update.failed[0].1, CoreError::InvalidTicker(_)));
        assert_eq!(store.columns(), &symbols(&["AAA", "CCC"])[..]);
    }

    #[tokio::test]
    async fn remove_absent_is_false() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        assert!(!store.remove_ticker("BBB"));
    }

    #[tokio::test]
    async fn added_column_uses_current_window() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        store.recompute_window(IndexWindow::new(10, 20));
        let version = store.normalized_version();

        store.add_ticker(&service, "CCC").await.unwrap();
        let ccc = store.normalized().column("CCC").unwrap();
        assert_eq!(ccc[10], 0.0);
        assert!(ccc[9].is_nan());
        assert!(ccc[21].is_nan());
        // Existing columns were not recomputed.
        assert_eq!(store.normalized_version(), version);
    }

    #[tokio::test]
    async fn reorder_moves_columns_without_recomputing() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA", "BBB", "CCC"]).await;
        let before = store.rolling_returns().clone();
        let version = store.normalized_version();

        store.reorder(&symbols(&["CCC", "AAA", "BBB"])).unwrap();
        assert_eq!(store.columns(), &symbols(&["CCC", "AAA", "BBB"])[..]);
        for label in ["AAA", "BBB", "CCC"] {
            assert_eq!(store.rolling_returns().column(label), before.column(label));
        }
        assert_eq!(store.normalized_version(), version);
    }

    #[tokio::test]
    async fn reorder_rejects_non_permutation() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA", "BBB"]).await;
        assert!(store.reorder(&symbols(&["AAA"])).is_err());
        assert!(store.reorder(&symbols(&["AAA", "CCC"])).is_err());
        assert!(store.reorder(&symbols(&["AAA", "AAA"])).is_err());
        assert_eq!(store.columns(), &symbols(&["AAA", "BBB"])[..]);
    }

    #[tokio::test]
    async fn update_tickers_reconciles() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA", "BBB"]).await;

        let update = store
            .update_tickers(&service, &symbols(&["CCC", "AAA", "NOPE"]))
            .await;
        assert!(update.changed());
        assert_eq!(update.added, symbols(&["CCC"]));
        assert_eq!(update.removed, symbols(&["BBB"]));
        assert!(update.reordered);
        assert_eq!(update.failed.len(), 1);
        assert_eq!(update.failed[0].0, "NOPE");
        assert_eq!(store.columns(), &symbols(&["CCC", "AAA"])[..]);
    }

    #[tokio::test]
    async fn update_with_same_tickers_changes_nothing() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA", "BBB"]).await;
        let update = store.update_tickers(&service, &symbols(&["AAA", "BBB"])).await;
        assert!(!update.changed());
        assert!(update.failed.is_empty());
    }

    #[tokio::test]
    async fn is_valid_ticker_probes() {
        let service = service_with(standard_provider(&test_timeline()));
        assert!(PriceSeriesStore::is_valid_ticker(&service, "DDD").await);
        assert!(!PriceSeriesStore::is_valid_ticker(&service, "NOPE").await);
        assert!(!PriceSeriesStore::is_valid_ticker(&service, "").await);
    }
}

// ═══════════════════════════════════════════════════════════════════
// Window recompute
// ═══════════════════════════════════════════════════════════════════

mod window {
    use super::*;

    #[tokio::test]
    async fn normalized_is_zero_at_window_start() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA", "BBB"]).await;
        let frame = store.recompute_window(IndexWindow::new(10, 20));
        for (_, column) in frame.iter() {
            assert_eq!(column[10], 0.0);
            assert!(column[..10].iter().all(|v| v.is_nan()));
            assert!(column[21..].iter().all(|v| v.is_nan()));
        }
        assert_close(store.normalized().value(20, "AAA").unwrap(), 120.0 / 110.0 - 1.0);
    }

    #[tokio::test]
    async fn recompute_keeps_every_column_in_order() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["CCC", "AAA", "BBB"]).await;
        store.reorder(&symbols(&["BBB", "CCC", "AAA"])).unwrap();
        let labels = store.recompute_window(IndexWindow::new(3, 50)).labels().to_vec();
        assert_eq!(labels, symbols(&["BBB", "CCC", "AAA"]));
        assert_eq!(labels.as_slice(), store.raw().labels());
    }

    #[tokio::test]
    async fn same_window_is_not_recomputed() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;

        store.recompute_window(IndexWindow::new(5, 30));
        assert_eq!(store.normalized_version(), 1);
        store.recompute_window(IndexWindow::new(5, 30));
        assert_eq!(store.normalized_version(), 1);
        store.recompute_window(IndexWindow::new(6, 30));
        assert_eq!(store.normalized_version(), 2);
    }

    #[tokio::test]
    async fn returns_do_not_depend_on_window() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        let period = store.period_returns().column("AAA").unwrap().to_vec();
        let rolling = store.rolling_returns().column("AAA").unwrap().to_vec();

        store.recompute_window(IndexWindow::new(30, 40));
        assert!(series_eq(store.period_returns().column("AAA").unwrap(), &period));
        assert!(series_eq(store.rolling_returns().column("AAA").unwrap(), &rolling));
    }

    #[tokio::test]
    async fn window_is_clamped_to_timeline() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        store.recompute_window(IndexWindow::new(60, 500));
        assert_eq!(store.window(), IndexWindow::new(60, 64));
    }

    #[tokio::test]
    async fn single_point_window() {
        let service = service_with(standard_provider(&test_timeline()));
        let mut store = store_for(&service, &["AAA"]).await;
        let frame = store.recompute_window(IndexWindow::new(64, 64));
        let column = frame.column("AAA").unwrap();
        assert_eq!(column[64], 0.0);
        assert!(column[63].is_nan());
        assert_eq!(store.timeline().get(64), Some(date(2024, 3, 29)));
    }
}
