use {
    super::PendingAnalysisQueue,
    crate::{
        data::{CandleStore, exchange::OhlcData},
        domain::TradingPair,
    },
    anyhow::{Result, bail},
};

/// What one OHLC payload added to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ingested {
    /// Payloads ingested, one per successful request.
    pub payloads: usize,
    pub received: usize,
    pub inserted: usize,
    pub queued: usize,
}

impl std::ops::AddAssign for Ingested {
    fn add_assign(&mut self, other: Self) {
        self.payloads += other.payloads;
        self.received += other.received;
        self.inserted += other.inserted;
        self.queued += other.queued;
    }
}

/// Persists one payload and queues its new candles for analysis.
pub(crate) async fn ingest(
    store: &dyn CandleStore,
    queue: &mut PendingAnalysisQueue,
    pair: &TradingPair,
    data: OhlcData,
) -> Result<Ingested> {
    if data.pair_tag() != *pair {
        bail!("Asked for {} but the exchange answered with {}", pair, data.pair);
    }

    let candles = data.into_candles();
    let received = candles.len();
    let new_timestamps = store.insert_candles(&candles).await?;
    let queued = queue
        .enqueue_unanalyzed(store, pair.url_symbol(), &new_timestamps)
        .await?;

    Ok(Ingested {
        payloads: 1,
        received,
        inserted: new_timestamps.len(),
        queued,
    })
}
