use async_trait::async_trait;

use crate::{
    config::EXCHANGE,
    data::exchange::{ApiResponse, ExchangeClient, OhlcData, OhlcRequest},
    domain::{CandleStep, TimeRange, TradingPair},
    error::ExchangeError,
};

/// Abstract source of OHLC candles. The engine only ever talks to this seam.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Closed candles whose timestamps fall in `range`, at most one request's worth.
    async fn fetch_ohlc(
        &self,
        pair: &TradingPair,
        step: CandleStep,
        range: TimeRange,
    ) -> Result<ApiResponse<OhlcData>, ExchangeError>;
}

/// OHLC straight from the exchange REST API.
pub struct ExchangeProvider {
    client: ExchangeClient,
}

impl ExchangeProvider {
    pub fn new(client: ExchangeClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ExchangeClient {
        &self.client
    }
}

#[async_trait]
impl MarketDataProvider for ExchangeProvider {
    async fn fetch_ohlc(
        &self,
        pair: &TradingPair,
        step: CandleStep,
        range: TimeRange,
    ) -> Result<ApiResponse<OhlcData>, ExchangeError> {
        let request = OhlcRequest {
            start: Some(range.start()),
            end: Some(range.end()),
            exclude_current_candle: Some(true),
            limit: EXCHANGE.limits.max_ohlc_items,
            ..OhlcRequest::new(pair.clone(), step)
        };
        self.client.get_ohlc(&request).await
    }
}
