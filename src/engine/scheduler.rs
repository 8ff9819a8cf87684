use {
    super::{BackfillReconciler, IncrementalFetcher, PendingAnalysisQueue, ingest::Ingested},
    crate::{
        analysis::IndicatorEngine,
        config::{DF, Settings},
        data::{CandleStore, MarketDataProvider},
        error::{ExchangeError, SchedulerError},
        utils::{epoch_sec_to_utc, now_timestamp_secs},
    },
    anyhow::{Context, Result},
    std::{sync::Arc, time::Duration},
    tokio::time::Instant,
};

/// What one scheduling cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub backfilled: Ingested,
    pub fetched: Ingested,
    /// Timestamp analysed this cycle, if any.
    pub analyzed: Option<i64>,
    pub pending: usize,
}

/// Drives one pair: backfill, incremental fetch, then one analysis per cycle.
pub struct Scheduler {
    settings: Arc<Settings>,
    store: Arc<dyn CandleStore>,
    backfill: BackfillReconciler,
    incremental: IncrementalFetcher,
    engine: IndicatorEngine,
    queue: PendingAnalysisQueue,
}

impl Scheduler {
    pub fn new(
        settings: Arc<Settings>,
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn CandleStore>,
    ) -> Self {
        Self {
            backfill: BackfillReconciler::from_settings(provider.clone(), store.clone(), &settings),
            incremental: IncrementalFetcher::from_settings(provider, store.clone(), &settings),
            engine: IndicatorEngine::new(settings.analysis.clone()),
            queue: PendingAnalysisQueue::new(),
            store,
            settings,
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    async fn pause(&self) {
        let pause = Duration::from_millis(self.settings.scheduler.step_pause_ms);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    /// One full pass at wall-clock second `now`.
    pub async fn run_cycle(&mut self, now: i64) -> Result<CycleReport> {
        let warmup = self.engine.required_candles().saturating_sub(1);
        self.queue
            .rebuild(
                self.store.as_ref(),
                self.settings.market.pair.url_symbol(),
                warmup,
            )
            .await
            .context("Rebuilding analysis queue")?;

        let backfilled = self
            .backfill
            .run(&mut self.queue, now)
            .await
            .context("Historical backfill")?;
        self.pause().await;

        let fetched = self
            .incremental
            .run(&mut self.queue, now)
            .await
            .context("Recent OHLC fetch")?;
        self.pause().await;

        let analyzed = self.analyze_next().await.context("Analysis")?;

        Ok(CycleReport {
            backfilled,
            fetched,
            analyzed,
            pending: self.queue.len(),
        })
    }

    /// Analyses the oldest queued candle. Entries without a full window behind
    /// them are dropped and the next one is tried.
    pub async fn analyze_next(&mut self) -> Result<Option<i64>> {
        let pair = self.settings.market.pair.url_symbol().to_string();
        let lookback = self.settings.analysis.lookback_candles();

        while let Some(timestamp) = self.queue.pop() {
            if self.store.has_analysis(&pair, timestamp).await? {
                continue;
            }
            let window = self.store.load_window(&pair, timestamp, lookback).await?;
            if window.last_timestamp() != Some(timestamp) {
                log::warn!("{}: candle {} vanished from the store, skipping", pair, timestamp);
                continue;
            }

            match self.engine.analyze(&pair, &window) {
                Ok(result) => {
                    self.store.insert_analysis(&result).await?;
                    if DF.log_analysis {
                        log::info!(
                            "{}: analysed {} ({} indicators)",
                            pair,
                            epoch_sec_to_utc(timestamp),
                            result.available_count()
                        );
                    }
                    return Ok(Some(timestamp));
                }
                Err(e) => {
                    log::warn!(
                        "{}: dropping {} from the analysis queue: {}",
                        pair,
                        epoch_sec_to_utc(timestamp),
                        e
                    );
                }
            }
        }
        Ok(None)
    }

    /// Returns once the store answers a ping. Polls while it does not, and gives
    /// up once it has been unreachable for longer than the configured wait.
    pub async fn wait_for_store(&self) -> Result<(), SchedulerError> {
        let wait = Duration::from_secs(self.settings.store.health_wait_secs);
        let poll = Duration::from_secs(self.settings.store.health_poll_secs);
        let mut first_failure: Option<Instant> = None;

        loop {
            match self.store.ping().await {
                Ok(()) => {
                    if first_failure.is_some() {
                        log::info!("Store is reachable again.");
                    }
                    return Ok(());
                }
                Err(e) => {
                    let since = *first_failure.get_or_insert_with(|| {
                        log::warn!("Waiting for the store to wake up: {:#}", e);
                        Instant::now()
                    });
                    if since.elapsed() > wait {
                        log::error!("Can't connect to the store. Bye.");
                        return Err(SchedulerError::StoreUnreachable {
                            waited_secs: since.elapsed().as_secs(),
                        });
                    }
                    log::debug!("Store still unreachable: {:#}", e);
                    tokio::time::sleep(poll).await;
                }
            }
        }
    }

    /// Single cycle, for one-shot runs.
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        self.wait_for_store().await?;
        self.run_cycle(now_timestamp_secs()).await
    }

    /// Runs cycles until the store stays unreachable, or until the optional
    /// consecutive-failure limit is hit. Failed cycles are retried after a backoff.
    pub async fn run(&mut self) -> Result<(), SchedulerError> {
        let mut failures: u32 = 0;

        loop {
            self.wait_for_store().await?;

            match self.run_cycle(now_timestamp_secs()).await {
                Ok(report) => {
                    failures = 0;
                    log::debug!("{}: cycle done {:?}", self.settings.market.pair, report);
                    tokio::time::sleep(self.settings.cycle_pause(report.backfilled.payloads)).await;
                }
                Err(e) => {
                    failures += 1;
                    match e.chain().find_map(|cause| cause.downcast_ref::<ExchangeError>()) {
                        Some(ExchangeError::Business(api_error)) => log::error!(
                            "{}: exchange rejected the request: {} (status {})",
                            self.settings.market.pair,
                            api_error,
                            api_error.status.as_deref().unwrap_or("-")
                        ),
                        _ => log::error!("{}: cycle failed: {:#}", self.settings.market.pair, e),
                    }

                    let limit = self.settings.scheduler.max_consecutive_failures;
                    if limit > 0 && failures >= limit {
                        return Err(SchedulerError::TooManyFailures {
                            failures,
                            last_error: e,
                        });
                    }
                    tokio::time::sleep(Duration::from_secs(
                        self.settings.scheduler.failure_backoff_secs,
                    ))
                    .await;
                }
            }
        }
    }
}
