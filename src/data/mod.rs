pub mod exchange;
mod provider;
mod rate_limiter;
mod storage;

pub use {
    provider::{ExchangeProvider, MarketDataProvider},
    rate_limiter::RateLimiter,
    storage::{CandleStore, MemoryStore, SqliteStore},
};
