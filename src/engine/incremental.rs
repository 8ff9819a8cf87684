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
    },
    anyhow::{Context, Result},
    futures::future::join_all,
    itertools::Itertools,
    std::sync::Arc,
};

/// Fetches the candles closed since the latest stored one.
///
/// Ranges whose request failed are kept and asked for again on the next run, so
/// a failed middle chunk does not leave a hole behind a newer sibling.
pub struct IncrementalFetcher {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn CandleStore>,
    pair: TradingPair,
    step: CandleStep,
    retry: Vec<TimeRange>,
    /// Stored history is searched for holes once, on the first run.
    scanned: bool,
}

impl IncrementalFetcher {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn CandleStore>,
        pair: TradingPair,
        step: CandleStep,
    ) -> Self {
        Self {
            provider,
            store,
            pair,
            step,
            retry: Vec::new(),
            scanned: false,
        }
    }

    pub fn from_settings(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn CandleStore>,
        settings: &Settings,
    ) -> Self {
        Self::new(provider, store, settings.market.pair.clone(), settings.market.step)
    }

    /// `[latest, now)` once the latest stored candle is at least one step old.
    /// An empty store counts as one step behind `now`.
    pub fn plan(&self, latest: Option<i64>, now: i64) -> Option<TimeRange> {
        let step = self.step.secs();
        let latest = latest.unwrap_or(now - step);
        if latest > now - step {
            return None;
        }
        TimeRange::new(latest, now)
    }

    /// Ranges still waiting for a successful request.
    pub fn pending_retries(&self) -> &[TimeRange] {
        &self.retry
    }

    /// Missing candles between consecutive stored timestamps.
    pub fn holes(timestamps: &[i64], step_secs: i64) -> Vec<TimeRange> {
        timestamps
            .iter()
            .tuple_windows()
            .filter(|(a, b)| *b - *a > step_secs)
            .filter_map(|(a, b)| TimeRange::new(a + step_secs, *b))
            .collect()
    }

    /// Requests every chunk at once and waits for all of them. Successful
    /// payloads are persisted in chunk order even when a sibling failed; failed
    /// chunks are kept for the next run and the first failure (in chunk order)
    /// is returned.
    pub async fn run(&mut self, queue: &mut PendingAnalysisQueue, now: i64) -> Result<Ingested> {
        let mut total = Ingested::default();

        if !self.scanned {
            let stored = self
                .store
                .candle_timestamps(self.pair.url_symbol())
                .await
                .context("Reading stored candles")?;
            let holes = Self::holes(&stored, self.step.secs());
            if !holes.is_empty() {
                log::warn!(
                    "{}: {} holes in the stored history, refilling them.",
                    self.pair,
                    holes.len()
                );
            }
            self.retry.extend(holes);
            self.scanned = true;
        }

        let latest = self
            .store
            .latest_candle_timestamp(self.pair.url_symbol())
            .await
            .context("Reading latest candle")?;
        let gap = self.plan(latest, now);

        if gap.is_none() && self.retry.is_empty() {
            return Ok(total);
        }
        if gap.is_some() {
            log::info!("{}: need to log some recent OHLC data.", self.pair);
        }

        let step = self.step.secs();
        let chunks: Vec<TimeRange> = std::mem::take(&mut self.retry)
            .into_iter()
            .chain(gap)
            .flat_map(|range| range.chunks(step, EXCHANGE.limits.max_ohlc_items))
            .collect();
        let requests = chunks.iter().map(|chunk| {
            if DF.log_chunks {
                log::info!("{}: requesting data from range {}", self.pair, chunk);
            }
            self.provider.fetch_ohlc(&self.pair, self.step, *chunk)
        });
        let responses = join_all(requests).await;

        let mut first_error: Option<anyhow::Error> = None;
        for (chunk, response) in chunks.iter().zip(responses) {
            let outcome = match response {
                Ok(ApiResponse::Success(data)) => Ok(data),
                Ok(ApiResponse::Error(api_error)) => Err(ExchangeError::Business(api_error)),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(data) => {
                    total += ingest(self.store.as_ref(), queue, &self.pair, data).await?;
                    log::info!("{}: logged some OHLC data.", self.pair);
                }
                Err(e) => {
                    log::warn!(
                        "{}: OHLC request for {} failed, will retry: {}",
                        self.pair,
                        chunk,
                        e
                    );
                    self.retry.push(*chunk);
                    if first_error.is_none() {
                        first_error =
                            Some(anyhow::Error::new(e).context(format!("OHLC request for {} failed", chunk)));
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        log::info!(
            "{}: recent OHLC data logging finished ({} new candles).",
            self.pair,
            total.inserted
        );
        Ok(total)
    }
}
