use {
    super::{
        PendingAnalysisQueue,
        ingest::{Ingested, ingest},
    },
    crate::{
        config::{DF, EXCHANGE, Settings},
        data::{CandleStore, MarketDataProvider, exchange::ApiResponse},
        domain::{CandleStep, TimeRange, TradingPair},
        error::ExchangeError,
        utils::{epoch_sec_to_utc, format_duration},
    },
    anyhow::{Context, Result},
    std::sync::Arc,
};

/// Keeps the store filled back to the history horizon.
pub struct BackfillReconciler {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn CandleStore>,
    pair: TradingPair,
    step: CandleStep,
    /// Minimum history span plus the analysis lookback.
    horizon_secs: i64,
}

impl BackfillReconciler {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn CandleStore>,
        pair: TradingPair,
        step: CandleStep,
        horizon_secs: i64,
    ) -> Self {
        Self {
            provider,
            store,
            pair,
            step,
            horizon_secs,
        }
    }

    pub fn from_settings(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn CandleStore>,
        settings: &Settings,
    ) -> Self {
        Self::new(
            provider,
            store,
            settings.market.pair.clone(),
            settings.market.step,
            settings.minimum_history_span_secs + settings.analysis_lookback_secs(),
        )
    }

    /// The range still missing in front of `earliest`, if it is more than one step wide.
    /// An empty store counts as starting at `now`.
    pub fn plan(&self, earliest: Option<i64>, now: i64) -> Option<TimeRange> {
        let intended_start = now - self.horizon_secs;
        let earliest = earliest.unwrap_or(now);
        if earliest <= intended_start + self.step.secs() {
            return None;
        }
        TimeRange::new(intended_start, earliest)
    }

    /// Fetches the missing history chunk by chunk, strictly in sequence.
    ///
    /// An error envelope stops the run; chunks already persisted stay.
    pub async fn run(&self, queue: &mut PendingAnalysisQueue, now: i64) -> Result<Ingested> {
        let mut total = Ingested::default();
        let earliest = self
            .store
            .earliest_candle_timestamp(self.pair.url_symbol())
            .await
            .context("Reading earliest candle")?;

        let Some(gap) = self.plan(earliest, now) else {
            return Ok(total);
        };

        log::info!(
            "{}: need to log some historical OHLC data ({} missing).",
            self.pair,
            format_duration(gap.span_secs())
        );

        // Newest chunk first: whatever succeeds stays contiguous with the stored
        // history, so a failed run resumes from the new earliest candle.
        let chunks: Vec<TimeRange> = gap
            .chunks(self.step.secs(), EXCHANGE.limits.max_ohlc_items)
            .collect();
        for chunk in chunks.into_iter().rev() {
            if DF.log_chunks {
                log::info!("{}: fetching OHLC from {}", self.pair, chunk);
            }
            let data = match self.provider.fetch_ohlc(&self.pair, self.step, chunk).await? {
                ApiResponse::Success(data) => data,
                ApiResponse::Error(api_error) => {
                    return Err(ExchangeError::Business(api_error))
                        .with_context(|| format!("OHLC request for {} failed", chunk));
                }
            };
            total += ingest(self.store.as_ref(), queue, &self.pair, data).await?;
            log::info!("{}: logged some OHLC data.", self.pair);
        }

        log::info!(
            "{}: historical OHLC data logging finished ({} new candles back to {}).",
            self.pair,
            total.inserted,
            epoch_sec_to_utc(gap.start())
        );
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryStore;

    struct NoProvider;

    #[async_trait::async_trait]
    impl MarketDataProvider for NoProvider {
        async fn fetch_ohlc(
            &self,
            _pair: &TradingPair,
            _step: CandleStep,
            _range: TimeRange,
        ) -> Result<ApiResponse<crate::data::exchange::OhlcData>, ExchangeError> {
            Err(ExchangeError::InvalidRequest("not expected".into()))
        }
    }

    fn reconciler(horizon_secs: i64) -> BackfillReconciler {
        BackfillReconciler::new(
            Arc::new(NoProvider),
            Arc::new(MemoryStore::new()),
            TradingPair::new("btcusd"),
            CandleStep::M15,
            horizon_secs,
        )
    }

    #[test]
    fn empty_store_backfills_the_whole_horizon() {
        let r = reconciler(10_000);
        assert_eq!(r.plan(None, 100_000), TimeRange::new(90_000, 100_000));
    }

    #[test]
    fn gap_ends_at_earliest_candle() {
        let r = reconciler(10_000);
        assert_eq!(r.plan(Some(95_000), 100_000), TimeRange::new(90_000, 95_000));
    }

    #[test]
    fn within_one_step_is_not_a_gap() {
        let r = reconciler(10_000);
        assert_eq!(r.plan(Some(90_900), 100_000), None);
        assert_eq!(r.plan(Some(90_000), 100_000), None);
        assert!(r.plan(Some(90_901), 100_000).is_some());
    }

    #[tokio::test]
    async fn nothing_to_do_makes_no_request() {
        let r = reconciler(10_000);
        r.store
            .insert_candles(&[crate::domain::Candle::new(
                "btcusd",
                90_000,
                1.into(),
                1.into(),
                1.into(),
                1.into(),
                1.into(),
            )])
            .await
            .unwrap();
        let mut queue = PendingAnalysisQueue::new();
        // NoProvider would fail the run if it were called
        let ingested = r.run(&mut queue, 100_000).await.unwrap();
        assert_eq!(ingested, Ingested::default());
    }
}
