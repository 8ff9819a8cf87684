mod common;

use {
    common::{Failure, MockProvider},
    ohlc_logger::{
        BackfillReconciler, Candle, CandleStep, CandleStore, MemoryStore, PendingAnalysisQueue,
        TimeRange, TradingPair, error::ExchangeError,
    },
    rust_decimal::Decimal,
    std::sync::Arc,
};

// 15m and 1m aligned
const NOW: i64 = 1_700_001_000;

fn candle(ts: i64) -> Candle {
    let one = Decimal::ONE;
    Candle::new("btcusd", ts, one, one, one, one, one)
}

fn range(start: i64, end: i64) -> TimeRange {
    TimeRange::new(start, end).unwrap()
}

#[tokio::test]
async fn backfill_requests_only_the_missing_front() {
    let provider = Arc::new(MockProvider::new());
    let store = Arc::new(MemoryStore::new());
    store
        .insert_candles(&[candle(NOW - 5_000), candle(NOW - 4_100)])
        .await
        .unwrap();

    let reconciler = BackfillReconciler::new(
        provider.clone(),
        store.clone(),
        TradingPair::new("btcusd"),
        CandleStep::M15,
        10_000,
    );
    let mut queue = PendingAnalysisQueue::new();
    let ingested = reconciler.run(&mut queue, NOW).await.unwrap();

    assert_eq!(provider.calls(), vec![range(NOW - 10_000, NOW - 5_000)]);
    assert!(ingested.inserted > 0);
    assert_eq!(ingested.queued, ingested.inserted);
    assert_eq!(
        store.earliest_candle_timestamp("btcusd").await.unwrap(),
        Some(NOW - 9_900)
    );

    // Once the front is filled there is nothing left to ask for
    provider.clear_calls();
    let again = reconciler.run(&mut queue, NOW).await.unwrap();
    assert_eq!(again.inserted, 0);
    assert!(provider.calls().is_empty());
}

#[tokio::test]
async fn business_error_keeps_newer_chunks_and_resumes() {
    // Three chunks of 1000 one-minute candles; the second request is rejected
    let provider = Arc::new(MockProvider::failing_on(1, Failure::Business));
    let store = Arc::new(MemoryStore::new());
    let reconciler = BackfillReconciler::new(
        provider.clone(),
        store.clone(),
        TradingPair::new("btcusd"),
        CandleStep::M1,
        150_000,
    );
    let mut queue = PendingAnalysisQueue::new();

    let err = reconciler.run(&mut queue, NOW).await.unwrap_err();
    let business = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ExchangeError>())
        .expect("exchange error in chain");
    assert!(business.is_business());
    assert_eq!(
        provider.calls(),
        vec![range(NOW - 30_000, NOW), range(NOW - 90_000, NOW - 30_000)]
    );

    // Newest chunk was persisted before the failure
    assert_eq!(
        store.earliest_candle_timestamp("btcusd").await.unwrap(),
        Some(NOW - 30_000)
    );
    assert_eq!(store.candle_timestamps("btcusd").await.unwrap().len(), 500);
    assert_eq!(queue.len(), 500);

    provider.heal();
    provider.clear_calls();
    let ingested = reconciler.run(&mut queue, NOW).await.unwrap();
    assert_eq!(
        provider.calls(),
        vec![
            range(NOW - 90_000, NOW - 30_000),
            range(NOW - 150_000, NOW - 90_000)
        ]
    );
    assert_eq!(ingested.inserted, 2_000);
    assert_eq!(
        store.earliest_candle_timestamp("btcusd").await.unwrap(),
        Some(NOW - 150_000)
    );
}

#[tokio::test]
async fn mismatched_pair_in_payload_is_rejected() {
    let provider = Arc::new(MockProvider::new());
    let store = Arc::new(MemoryStore::new());
    let reconciler = BackfillReconciler::new(
        provider,
        store.clone(),
        TradingPair::new("etheur"),
        CandleStep::M15,
        10_000,
    );
    let mut queue = PendingAnalysisQueue::new();

    // The mock always answers with BTC/USD
    assert!(reconciler.run(&mut queue, NOW).await.is_err());
    assert_eq!(store.latest_candle_timestamp("etheur").await.unwrap(), None);
    assert_eq!(store.latest_candle_timestamp("btcusd").await.unwrap(), None);
}
