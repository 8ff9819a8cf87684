#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeApiConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

impl Default for ExchangeApiConfig {
    fn default() -> Self {
        Self {
            timeout_ms: EXCHANGE.client.timeout_ms,
            retries: EXCHANGE.client.retries,
            backoff_ms: EXCHANGE.client.backoff_ms,
        }
    }
}

/// REST constraints: 1000 candles per OHLC call and a request budget per window.
pub struct RestLimits {
    pub max_ohlc_items: usize,
    pub requests_per_window: u32,
    pub window_secs: u64,
    pub request_cost: u32,
}

pub struct ClientDefaults {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
}

pub struct AuthScheme {
    /// Prefix of both the `X-Auth` header and the signed message.
    pub prefix: &'static str,
    pub version: &'static str,
    pub form_content_type: &'static str,
}

pub struct ExchangeConfig {
    pub base_url: &'static str,
    pub limits: RestLimits,
    pub client: ClientDefaults,
    pub auth: AuthScheme,
}

pub const EXCHANGE: ExchangeConfig = ExchangeConfig {
    base_url: "https://www.bitstamp.net/api/v2/",
    limits: RestLimits {
        max_ohlc_items: 1000,
        requests_per_window: 8000, // exchange allows 10k per 10 minutes
        window_secs: 600,
        request_cost: 1,
    },
    client: ClientDefaults {
        timeout_ms: 10_000,
        retries: 3,
        backoff_ms: 2_000,
    },
    auth: AuthScheme {
        prefix: "BITSTAMP",
        version: "v2",
        form_content_type: "application/x-www-form-urlencoded",
    },
};
