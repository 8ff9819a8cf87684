use std::ops::Deref;

use crate::domain::Candle;

/// Candles of one pair, strictly increasing by timestamp.
///
/// Gaps are allowed (missing data), duplicates and reordering are not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandleSeries {
    candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts and drops repeated timestamps (first occurrence wins).
    pub fn from_candles(mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);
        Self { candles }
    }

    /// Appends a candle. Rejects anything not strictly after the current last candle.
    pub fn push(&mut self, candle: Candle) -> Result<(), Candle> {
        match self.candles.last() {
            Some(last) if candle.timestamp <= last.timestamp => Err(candle),
            _ => {
                self.candles.push(candle);
                Ok(())
            }
        }
    }

    pub fn first_timestamp(&self) -> Option<i64> {
        self.candles.first().map(|c| c.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.candles.last().map(|c| c.timestamp)
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.candles.iter().map(|c| c.timestamp)
    }

    pub fn into_inner(self) -> Vec<Candle> {
        self.candles
    }
}

impl Deref for CandleSeries {
    type Target = [Candle];

    fn deref(&self) -> &Self::Target {
        &self.candles
    }
}
