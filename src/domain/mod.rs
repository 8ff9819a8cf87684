// Domain types and value objects
mod candle;
mod candle_series;
mod candle_step;
mod pair;
mod time_range;

// Re-export commonly used types to the world
pub use candle::Candle;
pub use candle_series::CandleSeries;
pub use candle_step::CandleStep;
pub use pair::TradingPair;
pub use time_range::{RangeChunks, TimeRange, chunks};
