mod common;

use {
    common::{Failure, MockProvider, settings},
    ohlc_logger::{
        CandleStep, CandleStore, MemoryStore, Scheduler, SqliteStore, TimeRange,
        error::{ExchangeError, SchedulerError},
    },
    std::{sync::Arc, time::Duration},
};

const NOW: i64 = 1_700_001_000;

// 6000s of history plus a 57 candle lookback at 1m
const HORIZON: i64 = 6_000 + 57 * 60;

fn range(start: i64, end: i64) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

fn scheduler(provider: Arc<MockProvider>, store: Arc<dyn CandleStore>) -> Scheduler {
    Scheduler::new(Arc::new(settings(CandleStep::M1, 6_000)), provider, store)
}

async fn two_cycles(store: Arc<dyn CandleStore>) {
    let provider = Arc::new(MockProvider::new());
    let mut scheduler = scheduler(provider.clone(), store.clone());

    let first = scheduler.run_cycle(NOW).await.unwrap();
    assert_eq!(
        provider.calls(),
        vec![range(NOW - HORIZON, NOW), range(NOW - 60, NOW)]
    );
    assert_eq!(first.backfilled.inserted, 157);
    assert_eq!(first.fetched.inserted, 0);
    // The 52 oldest candles lack a full window and are dropped
    assert_eq!(first.analyzed, Some(NOW - HORIZON + 52 * 60));
    assert_eq!(first.pending, 104);

    provider.clear_calls();
    let second = scheduler.run_cycle(NOW).await.unwrap();
    assert_eq!(provider.calls(), vec![range(NOW - 60, NOW)]);
    assert_eq!(second.backfilled.inserted, 0);
    assert_eq!(second.analyzed, Some(NOW - HORIZON + 53 * 60));
    assert_eq!(second.pending, 103);

    let analysed = store.analysis_timestamps("btcusd").await.unwrap();
    assert_eq!(
        analysed,
        vec![NOW - HORIZON + 52 * 60, NOW - HORIZON + 53 * 60]
    );
    let latest = store.latest_analysis("btcusd").await.unwrap().unwrap();
    assert_eq!(latest.timestamp, NOW - HORIZON + 53 * 60);
    assert!(latest.sma.is_some());
}

#[tokio::test]
async fn cycles_backfill_then_analyse_one_candle_each() {
    two_cycles(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn cycles_against_sqlite() {
    let store = SqliteStore::new(":memory:").await.unwrap();
    store.initialize().await.unwrap();
    two_cycles(Arc::new(store)).await;
}

#[tokio::test(start_paused = true)]
async fn unreachable_store_ends_the_run() {
    let store = Arc::new(MemoryStore::new());
    store.set_reachable(false);
    let mut scheduler = scheduler(Arc::new(MockProvider::new()), store.clone());

    let err = scheduler.run().await.unwrap_err();
    let SchedulerError::StoreUnreachable { waited_secs } = err else {
        panic!("unexpected error: {err}");
    };
    // Default wait is five minutes, polled every three seconds
    assert!(waited_secs >= 300);
    assert!(store.ping_count() > 100);
}

#[tokio::test(start_paused = true)]
async fn store_that_comes_back_is_waited_for() {
    let store = Arc::new(MemoryStore::new());
    store.set_reachable(false);
    let scheduler = scheduler(Arc::new(MockProvider::new()), store.clone());

    let waker = store.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(10)).await;
        waker.set_reachable(true);
    });

    scheduler.wait_for_store().await.unwrap();
    assert!(store.ping_count() >= 4);
}

#[tokio::test(start_paused = true)]
async fn exchange_failures_are_retried_without_limit_by_default() {
    let provider = Arc::new(MockProvider::failing_always(Failure::Protocol));
    let mut scheduler = scheduler(provider.clone(), Arc::new(MemoryStore::new()));

    // Ten minutes of a dead exchange at a 30s backoff
    let outcome = tokio::time::timeout(Duration::from_secs(600), scheduler.run()).await;
    assert!(outcome.is_err(), "scheduler gave up: {:?}", outcome);
    assert!(provider.calls().len() >= 15);
}

#[tokio::test(start_paused = true)]
async fn optional_failure_limit_stops_the_scheduler() {
    let provider = Arc::new(MockProvider::failing_always(Failure::Business));
    let mut settings = settings(CandleStep::M1, 6_000);
    settings.scheduler.max_consecutive_failures = 3;
    let mut scheduler = Scheduler::new(
        Arc::new(settings),
        provider.clone(),
        Arc::new(MemoryStore::new()),
    );

    let (failures, last_error) = match scheduler.run().await.unwrap_err() {
        SchedulerError::TooManyFailures {
            failures,
            last_error,
        } => (failures, last_error),
        other => panic!("unexpected error: {other}"),
    };
    assert_eq!(failures, 3);
    assert!(matches!(
        last_error
            .chain()
            .find_map(|cause| cause.downcast_ref::<ExchangeError>()),
        Some(ExchangeError::Business(_))
    ));
    // Backfill is the first request of every cycle and nothing gets past it
    assert_eq!(provider.calls().len(), 3);
}
