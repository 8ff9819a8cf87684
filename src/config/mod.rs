//! Configuration module for the OHLC logger.

mod analysis;
mod debug;
mod exchange;
mod settings;

// Re-export commonly used items
pub use analysis::{AnalysisParameters, LOOKBACK_SAFETY_MARGIN};
pub use debug::DF;
pub use exchange::{EXCHANGE, ExchangeApiConfig};
pub use settings::{
    ApiSettings, DEFAULT_SETTINGS_FILE, MarketSettings, SchedulerSettings, Settings,
    StoreSettings,
};
