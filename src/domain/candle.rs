use {
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
};

/// One OHLCV sample for a fixed time bucket. Identified by (pair, timestamp).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub pair: String,
    /// Bucket open time, Unix seconds.
    pub timestamp: i64,

    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,

    pub volume: Decimal,
}

impl Candle {
    // A constructor for convenience
    pub fn new(
        pair: impl Into<String>,
        timestamp: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Self {
        Candle {
            pair: pair.into(),
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> Decimal {
        (self.high + self.low + self.close) / Decimal::from(3)
    }

    /// high - low
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }
}
