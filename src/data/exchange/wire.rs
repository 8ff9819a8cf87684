//! Wire models for the exchange REST API (snake_case JSON, string-encoded numbers).

use {
    super::serde_str,
    crate::{
        config::EXCHANGE,
        domain::{Candle, CandleStep, TradingPair},
        error::ExchangeError,
    },
    chrono::NaiveDateTime,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::fmt,
};

// ── OHLC ────────────────────────────────────────────────────────────────

/// `GET ohlc/{pair}/` wraps its payload in `data`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OhlcEnvelope {
    pub data: OhlcData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcData {
    /// Display form, e.g. `BTC/USD`.
    pub pair: String,
    pub ohlc: Vec<Ohlc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlc {
    #[serde(with = "serde_str::number")]
    pub timestamp: i64,
    #[serde(with = "serde_str::number")]
    pub open: Decimal,
    #[serde(with = "serde_str::number")]
    pub high: Decimal,
    #[serde(with = "serde_str::number")]
    pub low: Decimal,
    #[serde(with = "serde_str::number")]
    pub close: Decimal,
    #[serde(with = "serde_str::number")]
    pub volume: Decimal,
}

impl OhlcData {
    /// Store tag for the pair: lowercase, no slash.
    pub fn pair_tag(&self) -> TradingPair {
        TradingPair::new(&self.pair)
    }

    pub fn into_candles(self) -> Vec<Candle> {
        let tag = self.pair_tag();
        self.ohlc
            .into_iter()
            .map(|o| {
                Candle::new(
                    tag.url_symbol(),
                    o.timestamp,
                    o.open,
                    o.high,
                    o.low,
                    o.close,
                    o.volume,
                )
            })
            .collect()
    }
}

/// Parameters of an OHLC request. Everything but the pair goes into the query string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OhlcRequest {
    #[serde(skip)]
    pub pair: TradingPair,
    pub step: CandleStep,
    pub limit: usize,
    /// Unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    /// Unix seconds. When both bounds are sent the exchange anchors on `end`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    /// Leave out the still-open candle.
    #[serde(with = "serde_str::option_boolean", skip_serializing_if = "Option::is_none")]
    pub exclude_current_candle: Option<bool>,
}

impl OhlcRequest {
    pub fn new(pair: TradingPair, step: CandleStep) -> Self {
        Self {
            pair,
            step,
            limit: EXCHANGE.limits.max_ohlc_items,
            start: None,
            end: None,
            exclude_current_candle: None,
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.limit == 0 || self.limit > EXCHANGE.limits.max_ohlc_items {
            return Err(ExchangeError::InvalidRequest(format!(
                "limit must be in [1, {}], got {}",
                EXCHANGE.limits.max_ohlc_items, self.limit
            )));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(ExchangeError::InvalidRequest(format!(
                    "start {} is after end {}",
                    start, end
                )));
            }
        }
        Ok(())
    }

    pub fn path(&self) -> String {
        format!("ohlc/{}/", self.pair.url_symbol())
    }

    pub fn query_string(&self) -> Result<String, ExchangeError> {
        serde_urlencoded::to_string(self)
            .map_err(|e| ExchangeError::InvalidRequest(format!("query encoding failed: {}", e)))
    }
}

// ── Market info ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    #[serde(with = "serde_str::number")]
    pub ask: Decimal,
    #[serde(with = "serde_str::number")]
    pub bid: Decimal,
    #[serde(with = "serde_str::number")]
    pub high: Decimal,
    #[serde(with = "serde_str::number")]
    pub last: Decimal,
    #[serde(with = "serde_str::number")]
    pub low: Decimal,
    #[serde(with = "serde_str::number")]
    pub open: Decimal,
    #[serde(default, with = "serde_str::option_number")]
    pub open_24: Option<Decimal>,
    #[serde(default, with = "serde_str::option_number")]
    pub percent_change_24: Option<Decimal>,
    #[serde(default, with = "serde_str::option_number")]
    pub side: Option<Decimal>,
    #[serde(with = "serde_str::number")]
    pub timestamp: i64,
    #[serde(with = "serde_str::number")]
    pub volume: Decimal,
    #[serde(with = "serde_str::number")]
    pub vwap: Decimal,
}

/// `GET trading-pairs-info/`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingPairInfo {
    pub name: String,
    pub url_symbol: String,
    pub base_decimals: u32,
    pub counter_decimals: u32,
    pub minimum_order: String,
    pub trading: String,
    pub instant_and_market_orders: String,
    pub description: String,
}

impl TradingPairInfo {
    pub fn is_enabled(&self) -> bool {
        self.trading.eq_ignore_ascii_case("enabled")
    }
}

// ── Account ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeData {
    pub currency_pair: String,
    pub fees: Fees,
    pub market: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    /// Applies when the order rests on the book and fills later.
    #[serde(with = "serde_str::number")]
    pub maker: Decimal,
    /// Applies when the order fills immediately.
    #[serde(with = "serde_str::number")]
    pub taker: Decimal,
}

impl Fees {
    pub fn maker_fee_for(&self, amount: Decimal) -> Decimal {
        amount * self.maker
    }

    pub fn taker_fee_for(&self, amount: Decimal) -> Decimal {
        amount * self.taker
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderType {
    Buy,
    Sell,
}

impl TryFrom<String> for OrderType {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        match raw.trim() {
            "0" => Ok(Self::Buy),
            "1" => Ok(Self::Sell),
            s if s.eq_ignore_ascii_case("buy") => Ok(Self::Buy),
            s if s.eq_ignore_ascii_case("sell") => Ok(Self::Sell),
            _ => Err(format!("Unable to convert {:?} to OrderType", raw)),
        }
    }
}

impl From<OrderType> for String {
    fn from(order_type: OrderType) -> Self {
        match order_type {
            OrderType::Buy => "0".to_string(),
            OrderType::Sell => "1".to_string(),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResponse {
    #[serde(with = "serde_str::number")]
    pub id: i64,
    /// Formatted as `BTC/USD`.
    pub market: String,
    #[serde(with = "serde_str::datetime")]
    pub datetime: NaiveDateTime,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(with = "serde_str::number")]
    pub price: Decimal,
    #[serde(with = "serde_str::number")]
    pub amount: Decimal,
    #[serde(default)]
    pub client_order_id: Option<String>,
}

/// Form body of `POST buy/{pair}/`. Unset options are left out of the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LimitOrderRequest {
    #[serde(with = "serde_str::number")]
    pub amount: Decimal,
    #[serde(with = "serde_str::number")]
    pub price: Decimal,
    /// Price of the follow-up sell order placed once this one executes.
    #[serde(with = "serde_str::option_number", skip_serializing_if = "Option::is_none")]
    pub limit_price: Option<Decimal>,
    /// Cancelled at 00:00 UTC unless executed.
    #[serde(with = "serde_str::option_boolean", skip_serializing_if = "Option::is_none")]
    pub daily_order: Option<bool>,
    /// Immediate-or-cancel.
    #[serde(with = "serde_str::option_boolean", skip_serializing_if = "Option::is_none")]
    pub ioc_order: Option<bool>,
    /// Fill-or-kill.
    #[serde(with = "serde_str::option_boolean", skip_serializing_if = "Option::is_none")]
    pub fok_order: Option<bool>,
    /// Maker-or-cancel.
    #[serde(with = "serde_str::option_boolean", skip_serializing_if = "Option::is_none")]
    pub moc_order: Option<bool>,
    /// Good-till-date; requires `expire_time`.
    #[serde(with = "serde_str::option_boolean", skip_serializing_if = "Option::is_none")]
    pub gtd_order: Option<bool>,
    /// Unix milliseconds.
    #[serde(with = "serde_str::option_number", skip_serializing_if = "Option::is_none")]
    pub expire_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl LimitOrderRequest {
    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.amount <= Decimal::ZERO || self.price <= Decimal::ZERO {
            return Err(ExchangeError::InvalidRequest(
                "amount and price must be positive".to_string(),
            ));
        }
        if self.gtd_order == Some(true) && self.expire_time.is_none() {
            return Err(ExchangeError::InvalidRequest(
                "expire_time is required for GTD orders".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_form(&self) -> Result<String, ExchangeError> {
        serde_urlencoded::to_string(self)
            .map_err(|e| ExchangeError::InvalidRequest(format!("form encoding failed: {}", e)))
    }
}
