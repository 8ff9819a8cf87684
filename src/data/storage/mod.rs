//! Persistence of candles and analysis rows, keyed by (pair tag, timestamp).

mod memory;
mod sqlite;

use {
    crate::{analysis::AnalysisResult, domain::{Candle, CandleSeries}},
    anyhow::Result,
    async_trait::async_trait,
};

pub use {memory::MemoryStore, sqlite::SqliteStore};

/// Append-only store of candles and their analysis. Rows are never updated:
/// inserting an existing (pair, timestamp) is a silent no-op.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Creates tables if needed. Safe to call repeatedly.
    async fn initialize(&self) -> Result<()>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<()>;

    async fn earliest_candle_timestamp(&self, pair: &str) -> Result<Option<i64>>;

    async fn latest_candle_timestamp(&self, pair: &str) -> Result<Option<i64>>;

    /// Every persisted candle timestamp for `pair`, ascending.
    async fn candle_timestamps(&self, pair: &str) -> Result<Vec<i64>>;

    /// Every analysed timestamp for `pair`, ascending.
    async fn analysis_timestamps(&self, pair: &str) -> Result<Vec<i64>>;

    async fn has_analysis(&self, pair: &str, timestamp: i64) -> Result<bool>;

    /// Persists `candles` and returns the timestamps that were not stored before, ascending.
    async fn insert_candles(&self, candles: &[Candle]) -> Result<Vec<i64>>;

    /// Up to `count` candles ending at or before `end_timestamp`, ascending.
    async fn load_window(&self, pair: &str, end_timestamp: i64, count: usize) -> Result<CandleSeries>;

    /// `false` when the timestamp was already analysed.
    async fn insert_analysis(&self, result: &AnalysisResult) -> Result<bool>;

    async fn latest_analysis(&self, pair: &str) -> Result<Option<AnalysisResult>>;
}
