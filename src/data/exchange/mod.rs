//! Bitstamp-style REST API: wire models, the success/error response split, request signing and the HTTP client.

mod client;
mod response;
mod serde_str;
mod signing;
mod wire;

pub use {
    client::ExchangeClient,
    response::{ApiError, ApiResponse},
    signing::{Credentials, SigningInput, canonical_message, new_nonce, sign},
    wire::{
        FeeData, Fees, LimitOrderRequest, Ohlc, OhlcData, OhlcRequest, OrderResponse, OrderType,
        Ticker, TradingPairInfo,
    },
};
