//! Runtime settings, loaded once at start-up and immutable afterwards.

use {
    crate::{
        Cli,
        config::AnalysisParameters,
        domain::{CandleStep, TradingPair},
        utils::TimeUtils,
    },
    anyhow::{Context, Result, bail},
    serde::{Deserialize, Serialize},
    std::{fmt, path::Path, time::Duration},
};

pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub market: MarketSettings,
    /// How far back the store must hold candles, not counting the analysis lookback.
    pub minimum_history_span_secs: i64,
    pub store: StoreSettings,
    pub scheduler: SchedulerSettings,
    pub analysis: AnalysisParameters,
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub key: String,
    pub secret: String,
}

// Never print the secret
impl fmt::Debug for ApiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiSettings")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketSettings {
    pub pair: TradingPair,
    pub step: CandleStep,
}

impl Default for MarketSettings {
    fn default() -> Self {
        Self {
            pair: TradingPair::new("btcusd"),
            step: CandleStep::M15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub path: String,
    /// Give up (exit 1) once the store has been unreachable for this long.
    pub health_wait_secs: u64,
    pub health_poll_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: "ohlc.sqlite".to_string(),
            health_wait_secs: 5 * 60,
            health_poll_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub failure_backoff_secs: u64,
    /// Exit after this many failed cycles in a row. 0 retries forever.
    pub max_consecutive_failures: u32,
    /// Pause after each fetch step.
    pub step_pause_ms: u64,
    /// Extra rest after a cycle, per backfill request it made.
    pub backfill_pause_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            failure_backoff_secs: 30,
            max_consecutive_failures: 0,
            step_pause_ms: 1_000,
            backfill_pause_ms: 2_000,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            market: MarketSettings::default(),
            minimum_history_span_secs: 60 * TimeUtils::SECS_IN_D,
            store: StoreSettings::default(),
            scheduler: SchedulerSettings::default(),
            analysis: AnalysisParameters::default(),
        }
    }
}

impl Settings {
    /// Reads `path` if it exists, otherwise starts from defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!(
                "Settings file {} not found, using defaults.",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Command line and environment win over the file.
    pub fn apply_cli(&mut self, cli: &Cli) -> Result<()> {
        if let Some(key) = &cli.api_key {
            self.api.key = key.clone();
        }
        if let Some(secret) = &cli.api_secret {
            self.api.secret = secret.clone();
        }
        if let Some(pair) = &cli.pair {
            self.market.pair = TradingPair::new(pair);
        }
        if let Some(step) = cli.step {
            self.market.step = CandleStep::try_from_secs(step).map_err(anyhow::Error::msg)?;
        }
        if let Some(db) = &cli.db {
            self.store.path = db.clone();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.market.pair.is_empty() {
            bail!("market.pair must not be empty");
        }
        if self.minimum_history_span_secs <= 0 {
            bail!(
                "minimum_history_span_secs must be positive (got {})",
                self.minimum_history_span_secs
            );
        }
        if self.store.health_poll_secs == 0 {
            bail!("store.health_poll_secs must be positive");
        }
        self.analysis.validate().map_err(anyhow::Error::msg)?;
        Ok(())
    }

    pub fn step_secs(&self) -> i64 {
        self.market.step.secs()
    }

    /// History reserved in front of the horizon so the oldest analysed candle has a full window.
    pub fn analysis_lookback_secs(&self) -> i64 {
        self.analysis.lookback_candles() as i64 * self.step_secs()
    }

    /// Oldest timestamp the store should hold at time `now`.
    pub fn horizon_start(&self, now: i64) -> i64 {
        now - self.minimum_history_span_secs - self.analysis_lookback_secs()
    }

    /// Sleep between scheduling cycles: half a candle step, plus a rest for
    /// every backfill request the cycle made.
    pub fn cycle_pause(&self, backfill_requests: usize) -> Duration {
        Duration::from_secs((self.step_secs() / 2).max(1) as u64)
            + Duration::from_millis(self.scheduler.backfill_pause_ms)
                .saturating_mul(u32::try_from(backfill_requests).unwrap_or(u32::MAX))
    }

    pub fn has_credentials(&self) -> bool {
        !self.api.key.is_empty() && !self.api.secret.is_empty()
    }
}
