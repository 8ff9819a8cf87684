use {
    crate::{config::DF, data::CandleStore},
    anyhow::Result,
    std::collections::{HashSet, VecDeque},
};

/// FIFO of candle timestamps that still need analysing.
///
/// A timestamp is queued at most once, and never when the store already holds
/// its analysis. The queue lives in memory only; [`rebuild`](Self::rebuild)
/// recovers it from the store.
#[derive(Debug, Default)]
pub struct PendingAnalysisQueue {
    queue: VecDeque<i64>,
    queued: HashSet<i64>,
}

impl PendingAnalysisQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.queued.contains(&timestamp)
    }

    pub fn peek(&self) -> Option<i64> {
        self.queue.front().copied()
    }

    pub fn pop(&mut self) -> Option<i64> {
        let timestamp = self.queue.pop_front()?;
        self.queued.remove(&timestamp);
        Some(timestamp)
    }

    fn push(&mut self, timestamp: i64) -> bool {
        if !self.queued.insert(timestamp) {
            return false;
        }
        self.queue.push_back(timestamp);
        true
    }

    /// Queues freshly ingested timestamps that have no stored analysis yet.
    /// Returns how many were added.
    pub async fn enqueue_unanalyzed(
        &mut self,
        store: &dyn CandleStore,
        pair: &str,
        timestamps: &[i64],
    ) -> Result<usize> {
        if timestamps.is_empty() {
            return Ok(0);
        }
        let analyzed: HashSet<i64> = store.analysis_timestamps(pair).await?.into_iter().collect();
        let added = timestamps
            .iter()
            .filter(|ts| !analyzed.contains(ts))
            .filter(|&&ts| self.push(ts))
            .count();

        if DF.log_queue {
            log::info!(
                "{}: queued {} of {} new candles for analysis ({} pending)",
                pair,
                added,
                timestamps.len(),
                self.len()
            );
        }
        Ok(added)
    }

    /// Replaces the queue with every stored candle that lacks an analysis, oldest
    /// first. The oldest `skip_oldest` candles are left out: they can never have a
    /// full window behind them.
    pub async fn rebuild(
        &mut self,
        store: &dyn CandleStore,
        pair: &str,
        skip_oldest: usize,
    ) -> Result<usize> {
        let candles = store.candle_timestamps(pair).await?;
        let analyzed: HashSet<i64> = store.analysis_timestamps(pair).await?.into_iter().collect();

        self.queue.clear();
        self.queued.clear();
        for timestamp in candles.into_iter().skip(skip_oldest) {
            if !analyzed.contains(&timestamp) {
                self.push(timestamp);
            }
        }

        if DF.log_queue {
            log::info!("{}: rebuilt analysis queue, {} pending", pair, self.len());
        }
        Ok(self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{analysis::AnalysisResult, data::MemoryStore, domain::Candle};
    use rust_decimal::Decimal;

    fn candle(ts: i64) -> Candle {
        Candle::new("btcusd", ts, Decimal::ONE, Decimal::ONE, Decimal::ONE, Decimal::ONE, Decimal::ONE)
    }

    #[tokio::test]
    async fn analysed_timestamps_are_never_queued() {
        let store = MemoryStore::new();
        store.insert_candles(&[candle(60), candle(120)]).await.unwrap();
        store
            .insert_analysis(&AnalysisResult::empty("btcusd", 60))
            .await
            .unwrap();

        let mut queue = PendingAnalysisQueue::new();
        let added = queue
            .enqueue_unanalyzed(&store, "btcusd", &[60, 120])
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert!(!queue.contains(60));

        // re-ingesting the same candles changes nothing
        let added = queue
            .enqueue_unanalyzed(&store, "btcusd", &[60, 120])
            .await
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn rebuild_is_the_store_difference_minus_warmup() {
        let store = MemoryStore::new();
        let candles: Vec<Candle> = (1..=6).map(|i| candle(i * 60)).collect();
        store.insert_candles(&candles).await.unwrap();
        store
            .insert_analysis(&AnalysisResult::empty("btcusd", 300))
            .await
            .unwrap();

        let mut queue = PendingAnalysisQueue::new();
        queue.push(9_999);
        assert_eq!(queue.rebuild(&store, "btcusd", 2).await.unwrap(), 3);
        assert_eq!(queue.pop(), Some(180));
        assert_eq!(queue.pop(), Some(240));
        assert_eq!(queue.pop(), Some(360));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn fifo_without_duplicates() {
        let mut queue = PendingAnalysisQueue::new();
        assert!(queue.push(3));
        assert!(queue.push(1));
        assert!(!queue.push(3));
        assert_eq!(queue.peek(), Some(3));
        assert_eq!(queue.pop(), Some(3));
        // popped entries may come back
        assert!(queue.push(3));
        assert_eq!(queue.len(), 2);
    }
}
