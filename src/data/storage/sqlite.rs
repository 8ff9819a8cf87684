use {
    super::CandleStore,
    crate::{
        analysis::{ANALYSIS_FIELDS, AnalysisResult},
        domain::{Candle, CandleSeries},
    },
    anyhow::{Context, Result},
    async_trait::async_trait,
    rust_decimal::Decimal,
    sqlx::{
        ConnectOptions, Pool, QueryBuilder, Row, Sqlite,
        sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
            SqliteSynchronous,
        },
    },
    std::{
        collections::{BTreeMap, BTreeSet},
        str::FromStr,
        time::Duration,
    },
};

/// 7 binds per candle row keeps each batch well under SQLite's 32k parameter limit.
const CANDLE_BATCH: usize = 3000;

/// Candles and analysis in one SQLite file. Decimals are stored as TEXT so no
/// precision is lost; an unavailable indicator is NULL.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new(db_path: &str) -> Result<Self> {
        let connection_options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(60))
            .synchronous(SqliteSynchronous::Normal)
            .log_slow_statements(log::LevelFilter::Warn, Duration::from_secs(10));

        // Every connection to ":memory:" would otherwise see its own database
        let max_connections = if db_path == ":memory:" { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connection_options)
            .await
            .with_context(|| format!("Failed to open store at {}", db_path))?;

        Ok(Self { pool })
    }

    fn decimal(row: &SqliteRow, column: &str) -> Result<Decimal> {
        let raw: String = row.try_get(column)?;
        Decimal::from_str(&raw).with_context(|| format!("Bad decimal {:?} in column {}", raw, column))
    }

    fn optional_decimal(row: &SqliteRow, column: &str) -> Result<Option<Decimal>> {
        let raw: Option<String> = row.try_get(column)?;
        raw.map(|raw| {
            Decimal::from_str(&raw)
                .with_context(|| format!("Bad decimal {:?} in column {}", raw, column))
        })
        .transpose()
    }

    fn candle_from_row(row: &SqliteRow) -> Result<Candle> {
        Ok(Candle::new(
            row.try_get::<String, _>("pair")?,
            row.try_get::<i64, _>("timestamp")?,
            Self::decimal(row, "open")?,
            Self::decimal(row, "high")?,
            Self::decimal(row, "low")?,
            Self::decimal(row, "close")?,
            Self::decimal(row, "volume")?,
        ))
    }

    fn analysis_from_row(row: &SqliteRow) -> Result<AnalysisResult> {
        let pair: String = row.try_get("pair")?;
        let timestamp: i64 = row.try_get("timestamp")?;
        let mut values = BTreeMap::new();
        for field in ANALYSIS_FIELDS {
            values.insert(field, Self::optional_decimal(row, field)?);
        }
        Ok(AnalysisResult::from_fields(pair, timestamp, |name| {
            values.get(name).copied().flatten()
        }))
    }

    async fn timestamps(&self, sql: &str, pair: &str) -> Result<Vec<i64>> {
        let rows = sqlx::query(sql).bind(pair).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<i64, _>("timestamp").map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl CandleStore for SqliteStore {
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ohlc_data (
                pair TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                open TEXT NOT NULL,
                high TEXT NOT NULL,
                low TEXT NOT NULL,
                close TEXT NOT NULL,
                volume TEXT NOT NULL,
                PRIMARY KEY (pair, timestamp)
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        let columns = ANALYSIS_FIELDS
            .iter()
            .map(|field| format!("{} TEXT", field))
            .collect::<Vec<_>>()
            .join(",\n                ");
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS analysis (
                pair TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                {},
                PRIMARY KEY (pair, timestamp)
            );
            "#,
            columns
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn earliest_candle_timestamp(&self, pair: &str) -> Result<Option<i64>> {
        let result = sqlx::query("SELECT MIN(timestamp) AS first_time FROM ohlc_data WHERE pair = ?")
            .bind(pair)
            .fetch_one(&self.pool)
            .await?;

        let first_time: Option<i64> = result.try_get("first_time")?;
        Ok(first_time)
    }

    async fn latest_candle_timestamp(&self, pair: &str) -> Result<Option<i64>> {
        let result = sqlx::query("SELECT MAX(timestamp) AS last_time FROM ohlc_data WHERE pair = ?")
            .bind(pair)
            .fetch_one(&self.pool)
            .await?;

        let last_time: Option<i64> = result.try_get("last_time")?;
        Ok(last_time)
    }

    async fn candle_timestamps(&self, pair: &str) -> Result<Vec<i64>> {
        self.timestamps(
            "SELECT timestamp FROM ohlc_data WHERE pair = ? ORDER BY timestamp ASC",
            pair,
        )
        .await
    }

    async fn analysis_timestamps(&self, pair: &str) -> Result<Vec<i64>> {
        self.timestamps(
            "SELECT timestamp FROM analysis WHERE pair = ? ORDER BY timestamp ASC",
            pair,
        )
        .await
    }

    async fn has_analysis(&self, pair: &str, timestamp: i64) -> Result<bool> {
        let found = sqlx::query("SELECT 1 FROM analysis WHERE pair = ? AND timestamp = ?")
            .bind(pair)
            .bind(timestamp)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_candles(&self, candles: &[Candle]) -> Result<Vec<i64>> {
        if candles.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_pair: BTreeMap<&str, Vec<&Candle>> = BTreeMap::new();
        for candle in candles {
            by_pair.entry(candle.pair.as_str()).or_default().push(candle);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = BTreeSet::new();

        for (pair, rows) in by_pair {
            let (lo, hi) = rows
                .iter()
                .fold((i64::MAX, i64::MIN), |(lo, hi), c| (lo.min(c.timestamp), hi.max(c.timestamp)));

            let existing: BTreeSet<i64> = sqlx::query(
                "SELECT timestamp FROM ohlc_data WHERE pair = ? AND timestamp BETWEEN ? AND ?",
            )
            .bind(pair)
            .bind(lo)
            .bind(hi)
            .fetch_all(&mut *tx)
            .await?
            .iter()
            .map(|row| row.try_get::<i64, _>("timestamp"))
            .collect::<Result<_, _>>()?;

            inserted.extend(
                rows.iter()
                    .map(|c| c.timestamp)
                    .filter(|ts| !existing.contains(ts)),
            );

            for chunk in rows.chunks(CANDLE_BATCH) {
                let mut query_builder = QueryBuilder::new(
                    "INSERT OR IGNORE INTO ohlc_data (pair, timestamp, open, high, low, close, volume) ",
                );

                query_builder.push_values(chunk, |mut b, c| {
                    b.push_bind(pair)
                        .push_bind(c.timestamp)
                        .push_bind(c.open.to_string())
                        .push_bind(c.high.to_string())
                        .push_bind(c.low.to_string())
                        .push_bind(c.close.to_string())
                        .push_bind(c.volume.to_string());
                });

                query_builder.build().execute(&mut *tx).await?;
            }
        }

        tx.commit().await?;
        Ok(inserted.into_iter().collect())
    }

    async fn load_window(&self, pair: &str, end_timestamp: i64, count: usize) -> Result<CandleSeries> {
        let rows = sqlx::query(
            r#"
            SELECT pair, timestamp, open, high, low, close, volume
            FROM ohlc_data
            WHERE pair = ? AND timestamp <= ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(pair)
        .bind(end_timestamp)
        .bind(i64::try_from(count).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let candles = rows
            .iter()
            .map(Self::candle_from_row)
            .collect::<Result<Vec<_>>>()?;

        // from_candles restores ascending order
        Ok(CandleSeries::from_candles(candles))
    }

    async fn insert_analysis(&self, result: &AnalysisResult) -> Result<bool> {
        let fields = result.fields();

        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT OR IGNORE INTO analysis (pair, timestamp");
        for (name, _) in &fields {
            query_builder.push(", ").push(*name);
        }
        query_builder.push(") VALUES (");
        {
            let mut values = query_builder.separated(", ");
            values.push_bind(result.pair.as_str());
            values.push_bind(result.timestamp);
            for (_, value) in &fields {
                values.push_bind(value.map(|v| v.to_string()));
            }
        }
        query_builder.push(")");

        let outcome = query_builder.build().execute(&self.pool).await?;
        Ok(outcome.rows_affected() == 1)
    }

    async fn latest_analysis(&self, pair: &str) -> Result<Option<AnalysisResult>> {
        let row = sqlx::query("SELECT * FROM analysis WHERE pair = ? ORDER BY timestamp DESC LIMIT 1")
            .bind(pair)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::analysis_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> SqliteStore {
        let store = SqliteStore::new(":memory:").await.unwrap();
        store.initialize().await.unwrap();
        store
    }

    fn candle(ts: i64, close: &str) -> Candle {
        let close = Decimal::from_str(close).unwrap();
        Candle::new("btcusd", ts, close, close, close, close, Decimal::ONE)
    }

    #[tokio::test]
    async fn reports_only_new_timestamps() {
        let store = store().await;
        let first = store
            .insert_candles(&[candle(60, "1"), candle(120, "2")])
            .await
            .unwrap();
        assert_eq!(first, vec![60, 120]);

        let second = store
            .insert_candles(&[candle(120, "2"), candle(180, "3")])
            .await
            .unwrap();
        assert_eq!(second, vec![180]);

        assert_eq!(store.earliest_candle_timestamp("btcusd").await.unwrap(), Some(60));
        assert_eq!(store.latest_candle_timestamp("btcusd").await.unwrap(), Some(180));
        assert_eq!(store.earliest_candle_timestamp("ethusd").await.unwrap(), None);
    }

    #[tokio::test]
    async fn decimals_survive_exactly() {
        let store = store().await;
        store
            .insert_candles(&[candle(60, "31872.123456789012345678")])
            .await
            .unwrap();
        let window = store.load_window("btcusd", 60, 10).await.unwrap();
        assert_eq!(window[0].close.to_string(), "31872.123456789012345678");
    }

    #[tokio::test]
    async fn window_is_trailing_and_ascending() {
        let store = store().await;
        let candles: Vec<Candle> = (1..=10).map(|i| candle(i * 60, "1")).collect();
        store.insert_candles(&candles).await.unwrap();

        let window = store.load_window("btcusd", 8 * 60, 3).await.unwrap();
        assert_eq!(window.timestamps().collect::<Vec<_>>(), vec![360, 420, 480]);
    }

    #[tokio::test]
    async fn analysis_is_written_once_with_nulls() {
        let store = store().await;
        let result = AnalysisResult {
            sma: Some(Decimal::new(125, 1)),
            ..AnalysisResult::empty("btcusd", 60)
        };
        assert!(store.insert_analysis(&result).await.unwrap());
        assert!(!store.insert_analysis(&result).await.unwrap());
        assert!(store.has_analysis("btcusd", 60).await.unwrap());
        assert_eq!(store.analysis_timestamps("btcusd").await.unwrap(), vec![60]);

        let loaded = store.latest_analysis("btcusd").await.unwrap().unwrap();
        assert_eq!(loaded, result);
    }
}
