#![allow(clippy::collapsible_if)]
#![allow(clippy::too_many_arguments)]

// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod utils;

// Re-export commonly used types outside of crate (for the binaries and tests)
pub use analysis::{AnalysisResult, IndicatorEngine};
pub use config::Settings;
pub use data::{CandleStore, MarketDataProvider, MemoryStore, SqliteStore};
pub use domain::{Candle, CandleSeries, CandleStep, TimeRange, TradingPair};
pub use engine::{BackfillReconciler, IncrementalFetcher, PendingAnalysisQueue, Scheduler};

use {
    anyhow::{Context, Result},
    clap::Parser,
    config::{DEFAULT_SETTINGS_FILE, ExchangeApiConfig},
    data::{
        ExchangeProvider,
        exchange::{ApiResponse, Credentials, ExchangeClient},
    },
    std::{path::PathBuf, sync::Arc},
};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Logs exchange OHLC candles and their technical indicators", long_about = None)]
pub struct Cli {
    /// JSON settings file. Missing file means defaults.
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    pub config: PathBuf,

    /// SQLite database path (overrides store.path)
    #[arg(long)]
    pub db: Option<String>,

    /// Trading pair, e.g. btcusd or BTC/USD (overrides market.pair)
    #[arg(long)]
    pub pair: Option<String>,

    /// Candle step in seconds (overrides market.step)
    #[arg(long)]
    pub step: Option<i64>,

    #[arg(long, env = "BITSTAMP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "BITSTAMP_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Run a single cycle and exit
    #[arg(long, default_value_t = false)]
    pub once: bool,

    /// Keep everything in memory instead of SQLite (nothing is persisted)
    #[arg(long, default_value_t = false)]
    pub memory: bool,
}

/// Loads settings: file first, then command line and environment.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&cli.config)?;
    settings.apply_cli(cli)?;
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

/// Warns when the configured pair is not tradable. Never fatal.
async fn check_pair(client: &ExchangeClient, pair: &TradingPair) {
    match client.get_trading_pairs().await {
        Ok(ApiResponse::Success(pairs)) => {
            match pairs.iter().find(|p| p.url_symbol == pair.url_symbol()) {
                Some(info) if info.is_enabled() => {
                    log::info!("{} ({}) is listed and enabled.", info.name, info.description)
                }
                Some(info) => log::warn!("{} is listed but trading is {}.", info.name, info.trading),
                None => log::warn!("{} is not among the {} listed pairs.", pair, pairs.len()),
            }
        }
        Ok(ApiResponse::Error(e)) => log::warn!("Could not list trading pairs: {}", e),
        Err(e) => log::warn!("Could not list trading pairs: {}", e),
    }
}

/// Application entry point: wires settings, store, exchange and scheduler, then runs.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = Arc::new(load_settings(&cli)?);
    log::info!(
        "Logging {} every {} with {} of history.",
        settings.market.pair,
        settings.market.step,
        utils::format_duration(settings.minimum_history_span_secs)
    );

    let store: Arc<dyn CandleStore> = if cli.memory {
        log::warn!("Using the in-memory store: nothing survives a restart.");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(SqliteStore::new(&settings.store.path).await?)
    };
    store.initialize().await.context("Initialising store")?;

    let credentials = settings
        .has_credentials()
        .then(|| Credentials::new(&settings.api.key, &settings.api.secret));
    if credentials.is_none() {
        log::info!("No API credentials configured; private endpoints are unavailable.");
    }
    let client = ExchangeClient::new(credentials, ExchangeApiConfig::default())?;
    check_pair(&client, &settings.market.pair).await;

    let provider: Arc<dyn MarketDataProvider> = Arc::new(ExchangeProvider::new(client));
    let mut scheduler = Scheduler::new(settings.clone(), provider, store);

    if cli.once {
        let report = scheduler.run_once().await?;
        log::info!(
            "Cycle finished: {} backfilled, {} fetched, analysed {:?}, {} pending.",
            report.backfilled.inserted,
            report.fetched.inserted,
            report.analyzed.map(utils::epoch_sec_to_utc),
            report.pending
        );
        return Ok(());
    }

    scheduler.run().await?;
    Ok(())
}
