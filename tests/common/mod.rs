#![allow(dead_code)]

use {
    async_trait::async_trait,
    ohlc_logger::{
        CandleStep, MarketDataProvider, TimeRange, TradingPair,
        config::{MarketSettings, SchedulerSettings, Settings},
        data::exchange::{ApiError, ApiResponse, Ohlc, OhlcData},
        error::ExchangeError,
    },
    rust_decimal::Decimal,
    std::{sync::Mutex, time::Duration},
};

pub type Reply = Result<ApiResponse<OhlcData>, ExchangeError>;

/// Answers OHLC requests with synthetic candles and records every request.
pub struct MockProvider {
    calls: Mutex<Vec<TimeRange>>,
    failing: Mutex<Option<(Option<usize>, Failure)>>,
    /// Earlier chunks answer later, to shuffle completion order.
    delay_earlier: bool,
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Business,
    Protocol,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(None),
            delay_earlier: false,
        }
    }

    /// Call number `n` (0-based, in request order) fails.
    pub fn failing_on(n: usize, failure: Failure) -> Self {
        let mock = Self::new();
        *mock.failing.lock().unwrap() = Some((Some(n), failure));
        mock
    }

    pub fn failing_always(failure: Failure) -> Self {
        let mock = Self::new();
        *mock.failing.lock().unwrap() = Some((None, failure));
        mock
    }

    pub fn with_reversed_latency(mut self) -> Self {
        self.delay_earlier = true;
        self
    }

    pub fn heal(&self) {
        *self.failing.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<TimeRange> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// One candle per step-aligned timestamp in `[start, end)`.
pub fn synthetic_ohlc(range: TimeRange, step: CandleStep) -> OhlcData {
    let step = step.secs();
    let first = range.start() + (step - range.start().rem_euclid(step)) % step;
    let ohlc = (first..range.end())
        .step_by(step as usize)
        .map(|ts| {
            let close = Decimal::from(100 + (ts / step) % 7);
            Ohlc {
                timestamp: ts,
                open: close - Decimal::ONE,
                high: close + Decimal::TWO,
                low: close - Decimal::TWO,
                close,
                volume: Decimal::new(15, 1),
            }
        })
        .collect();
    OhlcData {
        pair: "BTC/USD".to_string(),
        ohlc,
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn fetch_ohlc(&self, _pair: &TradingPair, step: CandleStep, range: TimeRange) -> Reply {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(range);
            calls.len() - 1
        };

        if self.delay_earlier {
            // first call sleeps longest
            tokio::time::sleep(Duration::from_millis(30u64.saturating_sub(call as u64 * 10))).await;
        }

        let failure = match *self.failing.lock().unwrap() {
            Some((None, failure)) => Some(failure),
            Some((Some(n), failure)) if n == call => Some(failure),
            _ => None,
        };
        match failure {
            Some(Failure::Business) => Ok(ApiResponse::Error(
                ApiError::new("Too many requests").with_code("API0001"),
            )),
            Some(Failure::Protocol) => Err(ExchangeError::Protocol {
                reason: "unexpected response shape".to_string(),
                body: "<html>502</html>".to_string(),
            }),
            None => Ok(ApiResponse::Success(synthetic_ohlc(range, step))),
        }
    }
}

pub fn settings(step: CandleStep, minimum_history_span_secs: i64) -> Settings {
    Settings {
        market: MarketSettings {
            pair: TradingPair::new("btcusd"),
            step,
        },
        minimum_history_span_secs,
        scheduler: SchedulerSettings {
            step_pause_ms: 0,
            ..Default::default()
        },
        ..Default::default()
    }
}
