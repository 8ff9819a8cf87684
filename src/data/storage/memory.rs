use {
    super::CandleStore,
    crate::{
        analysis::AnalysisResult,
        domain::{Candle, CandleSeries},
    },
    anyhow::{Result, bail},
    async_trait::async_trait,
    std::{
        collections::{BTreeMap, HashMap},
        sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    tokio::sync::Mutex,
};

#[derive(Default)]
struct Tables {
    candles: HashMap<String, BTreeMap<i64, Candle>>,
    analysis: HashMap<String, BTreeMap<i64, AnalysisResult>>,
}

/// Process-local store. Nothing survives a restart.
///
/// Reachability can be switched off to simulate an outage: every call then fails.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    reachable: AtomicBool,
    pings: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            reachable: AtomicBool::new(true),
            pings: AtomicUsize::new(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of `ping` calls so far, reachable or not.
    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if !self.reachable.load(Ordering::SeqCst) {
            bail!("memory store is switched off");
        }
        Ok(())
    }
}

#[async_trait]
impl CandleStore for MemoryStore {
    async fn initialize(&self) -> Result<()> {
        self.check()
    }

    async fn ping(&self) -> Result<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.check()
    }

    async fn earliest_candle_timestamp(&self, pair: &str) -> Result<Option<i64>> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .candles
            .get(pair)
            .and_then(|rows| rows.keys().next().copied()))
    }

    async fn latest_candle_timestamp(&self, pair: &str) -> Result<Option<i64>> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .candles
            .get(pair)
            .and_then(|rows| rows.keys().next_back().copied()))
    }

    async fn candle_timestamps(&self, pair: &str) -> Result<Vec<i64>> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .candles
            .get(pair)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn analysis_timestamps(&self, pair: &str) -> Result<Vec<i64>> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .analysis
            .get(pair)
            .map(|rows| rows.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn has_analysis(&self, pair: &str, timestamp: i64) -> Result<bool> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .analysis
            .get(pair)
            .is_some_and(|rows| rows.contains_key(&timestamp)))
    }

    async fn insert_candles(&self, candles: &[Candle]) -> Result<Vec<i64>> {
        self.check()?;
        let mut tables = self.tables.lock().await;
        let mut inserted = Vec::new();
        for candle in candles {
            let rows = tables.candles.entry(candle.pair.clone()).or_default();
            if !rows.contains_key(&candle.timestamp) {
                rows.insert(candle.timestamp, candle.clone());
                inserted.push(candle.timestamp);
            }
        }
        inserted.sort_unstable();
        Ok(inserted)
    }

    async fn load_window(&self, pair: &str, end_timestamp: i64, count: usize) -> Result<CandleSeries> {
        self.check()?;
        let tables = self.tables.lock().await;
        let mut window: Vec<Candle> = tables
            .candles
            .get(pair)
            .map(|rows| {
                rows.range(..=end_timestamp)
                    .rev()
                    .take(count)
                    .map(|(_, c)| c.clone())
                    .collect()
            })
            .unwrap_or_default();
        window.reverse();
        Ok(CandleSeries::from_candles(window))
    }

    async fn insert_analysis(&self, result: &AnalysisResult) -> Result<bool> {
        self.check()?;
        let mut tables = self.tables.lock().await;
        let rows = tables.analysis.entry(result.pair.clone()).or_default();
        if rows.contains_key(&result.timestamp) {
            return Ok(false);
        }
        rows.insert(result.timestamp, result.clone());
        Ok(true)
    }

    async fn latest_analysis(&self, pair: &str) -> Result<Option<AnalysisResult>> {
        self.check()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .analysis
            .get(pair)
            .and_then(|rows| rows.values().next_back().cloned()))
    }
}
