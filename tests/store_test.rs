//! File-backed storage round-trips: price history upserts, sync
//! staleness, snapshot recording and realized-return computation.

mod common;

use chrono::{Duration, NaiveDate};
use common::*;
use equiscore::adapters::file_config_adapter::FileConfigAdapter;
use equiscore::adapters::sqlite_price_store::SqlitePriceStore;
use equiscore::adapters::sqlite_snapshot_store::SqliteSnapshotStore;

fn price_store(dir: &tempfile::TempDir) -> SqlitePriceStore {
    let ini = format!(
        "[store]\npath = {}\n",
        dir.path().join("prices.db").display()
    );
    let config = FileConfigAdapter::from_string(&ini).unwrap();
    SqlitePriceStore::from_config(&config).unwrap()
}

fn snapshot_store(dir: &tempfile::TempDir) -> SqliteSnapshotStore {
    let ini = format!(
        "[snapshots]\npath = {}\n",
        dir.path().join("snapshots.db").display()
    );
    let config = FileConfigAdapter::from_string(&ini).unwrap();
    SqliteSnapshotStore::from_config(&config).unwrap()
}

#[test]
fn price_round_trip_is_date_ordered() {
    let dir = tempfile::tempdir().unwrap();
    let store = price_store(&dir);

    // Insert out of order; reads come back ascending
    let points = vec![
        make_point("INFY", "2024-01-03", 102.0),
        make_point("INFY", "2024-01-01", 100.0),
        make_point("INFY", "2024-01-02", 101.0),
    ];
    store.store_prices("INFY", &points).unwrap();

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    let stored = store.stored_prices("INFY", start, end).unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.windows(2).all(|w| w[0].date < w[1].date));
    assert_eq!(stored[0].close, 100.0);
}

#[test]
fn restoring_same_day_overwrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let store = price_store(&dir);

    store
        .store_prices("TCS", &[make_point("TCS", "2024-02-01", 100.0)])
        .unwrap();
    store
        .store_prices("TCS", &[make_point("TCS", "2024-02-01", 105.0)])
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    let stored = store.stored_prices("TCS", start, start).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].close, 105.0);

    let stats = store.stats().unwrap();
    assert_eq!(stats.symbols_stored, 1);
    assert_eq!(stats.total_records, 1);
}

#[test]
fn staleness_flips_with_sync_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = price_store(&dir);

    // Never-synced symbols are always stale
    assert!(store.is_stale("SBIN", 6).unwrap());

    store
        .store_prices("SBIN", &[make_point("SBIN", "2024-03-01", 500.0)])
        .unwrap();
    assert!(!store.is_stale("SBIN", 6).unwrap());
    // A zero-hour budget makes any sync stale
    assert!(store.is_stale("SBIN", 0).unwrap());
}

#[test]
fn snapshot_returns_over_a_week() {
    let dir = tempfile::tempdir().unwrap();
    let store = snapshot_store(&dir);

    let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let end = start + Duration::days(7);

    // Build two scored stocks through the real pipeline types
    let mut scored = scored_pair(100.0, 200.0);
    store.record_snapshot(&scored, "daily", start).unwrap();

    // A week later INFY is up 10%, TCS down 5%
    scored[0].price = 110.0;
    scored[1].price = 190.0;
    store.record_snapshot(&scored, "daily", end).unwrap();

    let report = store.compute_returns(7, end).unwrap().unwrap();
    assert_eq!(report.total_recommendations, 2);
    assert!((report.avg_return_pct - 2.5).abs() < 1e-9);
    assert!((report.win_rate_pct - 50.0).abs() < 1e-9);
    assert_eq!(report.detail[0].symbol, "INFY");
    assert!((report.detail[0].return_pct - 10.0).abs() < 1e-9);
    store.save_run(&report).unwrap();
}

#[test]
fn empty_window_reports_no_data() {
    let dir = tempfile::tempdir().unwrap();
    let store = snapshot_store(&dir);
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    assert!(store.compute_returns(30, today).unwrap().is_none());
}

#[test]
fn history_filters_by_symbol_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = snapshot_store(&dir);

    let day1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let day2 = day1 + Duration::days(1);
    let scored = scored_pair(100.0, 200.0);
    store.record_snapshot(&scored, "daily", day1).unwrap();
    store.record_snapshot(&scored, "daily", day2).unwrap();

    let all = store.history(30, None, day2).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all[0].date >= all[all.len() - 1].date);

    let infy = store.history(30, Some("INFY"), day2).unwrap();
    assert_eq!(infy.len(), 2);
    assert!(infy.iter().all(|r| r.symbol == "INFY"));

    let stats = store.tracking_stats().unwrap();
    assert_eq!(stats.total_recommendations, 4);
    assert_eq!(stats.tracking_days, 2);
    assert_eq!(stats.latest_date, Some(day2));
}

/// Two scored stocks produced by the real scoring path over synthetic
/// series, with prices pinned afterwards.
fn scored_pair(price_a: f64, price_b: f64) -> Vec<equiscore::domain::scoring::ScoredStock> {
    use equiscore::domain::timeframe::Timeframe;
    use equiscore::engine::{Analyzer, ProgressTracker};

    let provider = MockProvider::new()
        .with_closes("INFY.NS", &rising_closes(40))
        .with_fundamentals("INFY.NS", sample_fundamentals(price_a, 50.0))
        .with_closes("TCS.NS", &falling_closes(40))
        .with_fundamentals("TCS.NS", sample_fundamentals(price_b, 120.0));
    let analyzer = Analyzer::new(
        equiscore::adapters::sqlite_price_store::SqlitePriceStore::in_memory().unwrap(),
        provider,
        &FileConfigAdapter::empty(),
    );

    let progress = ProgressTracker::new();
    let mut stocks = analyzer.scan(Timeframe::Daily, &progress);
    stocks.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    assert_eq!(stocks.len(), 2);
    stocks[0].price = price_a; // INFY
    stocks[1].price = price_b; // TCS
    stocks
}
