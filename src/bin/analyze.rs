use anyhow::{Context, Result, bail};
use clap::Parser;
use ohlc_logger::{CandleStore, IndicatorEngine, Settings, SqliteStore, TradingPair};
use std::path::PathBuf;

/// Prints the stored analysis of the latest candle, or computes it on the spot.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = ohlc_logger::config::DEFAULT_SETTINGS_FILE)]
    config: PathBuf,

    #[arg(long)]
    db: Option<String>,

    #[arg(long)]
    pair: Option<String>,

    /// Recompute from stored candles instead of reading the analysis table
    #[arg(long, default_value_t = false)]
    recompute: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = Settings::load(&args.config)?;
    let db_path = args.db.unwrap_or_else(|| settings.store.path.clone());
    let pair = args
        .pair
        .map(|p| TradingPair::new(&p))
        .unwrap_or_else(|| settings.market.pair.clone());

    let store = SqliteStore::new(&db_path)
        .await
        .context("Failed to open the store. Run ohlc-logger first to populate it!")?;
    store.initialize().await?;

    if !args.recompute {
        match store.latest_analysis(pair.url_symbol()).await? {
            Some(result) => print!("{}", result),
            None => log::warn!("No analysis stored for {} yet.", pair),
        }
        return Ok(());
    }

    let Some(latest) = store.latest_candle_timestamp(pair.url_symbol()).await? else {
        bail!("No candles stored for {}", pair);
    };
    let engine = IndicatorEngine::new(settings.analysis.clone());
    let window = store
        .load_window(pair.url_symbol(), latest, settings.analysis.lookback_candles())
        .await?;
    log::info!("Recomputing {} over {} candles.", pair, window.len());

    let result = engine.analyze(pair.url_symbol(), &window)?;
    print!("{}", result);
    Ok(())
}
