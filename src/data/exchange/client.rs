use {
    super::{
        response::ApiResponse,
        signing::{self, Credentials, SigningInput},
        wire::{
            FeeData, LimitOrderRequest, OhlcData, OhlcEnvelope, OhlcRequest, OrderResponse,
            Ticker, TradingPairInfo,
        },
    },
    crate::{
        config::{DF, EXCHANGE, ExchangeApiConfig},
        data::rate_limiter::RateLimiter,
        domain::TradingPair,
        error::ExchangeError,
        utils::now_timestamp_ms,
    },
    reqwest::{
        Client, Url,
        header::{CONTENT_TYPE, HeaderMap, HeaderValue},
    },
    serde::de::DeserializeOwned,
    std::time::Duration,
};

/// REST client for the exchange. Public calls are plain GETs, private calls are
/// signed POSTs. Every call goes through the shared rate limiter.
#[derive(Clone)]
pub struct ExchangeClient {
    http: Client,
    base_url: Url,
    credentials: Option<Credentials>,
    limiter: RateLimiter,
    config: ExchangeApiConfig,
}

impl ExchangeClient {
    pub fn new(credentials: Option<Credentials>, config: ExchangeApiConfig) -> Result<Self, ExchangeError> {
        Self::with_base_url(EXCHANGE.base_url, credentials, config)
    }

    /// Points the client at another host, e.g. a local mock server.
    pub fn with_base_url(
        base_url: &str,
        credentials: Option<Credentials>,
        config: ExchangeApiConfig,
    ) -> Result<Self, ExchangeError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ExchangeError::InvalidRequest(format!("bad base url {:?}: {}", base_url, e)))?;
        // Url::join drops the last segment unless the path ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url,
            credentials,
            limiter: RateLimiter::new(
                EXCHANGE.limits.requests_per_window,
                EXCHANGE.limits.window_secs,
            ),
            config,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn endpoint(&self, path: &str, query: &str) -> Result<Url, ExchangeError> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| ExchangeError::InvalidRequest(format!("bad path {:?}: {}", path, e)))?;
        url.set_query((!query.is_empty()).then_some(query));
        Ok(url)
    }

    /// Unsigned GET. Transport failures are retried with linear backoff; answers are not.
    async fn get<T: DeserializeOwned>(&self, path: &str, query: &str) -> Result<ApiResponse<T>, ExchangeError> {
        let url = self.endpoint(path, query)?;
        let mut attempt = 0;

        loop {
            self.limiter.acquire(EXCHANGE.limits.request_cost, path).await;
            if DF.log_requests {
                log::info!("GET {}", url);
            }

            match self.http.get(url.clone()).send().await {
                Ok(response) => {
                    let body = response.text().await?;
                    return ApiResponse::decode(&body);
                }
                Err(e) if attempt < self.config.retries && Self::is_retryable(&e) => {
                    attempt += 1;
                    let delay = Duration::from_millis(self.config.backoff_ms * attempt as u64);
                    log::warn!(
                        "GET {} failed ({}), retry {}/{} in {:?}",
                        path,
                        e,
                        attempt,
                        self.config.retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Signed POST. Never retried: the nonce is single-use and orders must not be doubled.
    async fn post_authenticated<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Option<String>,
    ) -> Result<ApiResponse<T>, ExchangeError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| ExchangeError::Signing("API key and secret are not configured".to_string()))?;

        let url = self.endpoint(path, "")?;
        let body = form.unwrap_or_default();
        let nonce = signing::new_nonce();
        let timestamp_ms = now_timestamp_ms();
        let host = url.host_str().unwrap_or_default().to_string();

        let input = SigningInput {
            method: "POST",
            host: &host,
            path: url.path(),
            query: url.query().unwrap_or_default(),
            body: &body,
            nonce: &nonce,
            timestamp_ms,
        };
        let signature = signing::sign(credentials, &input)?;
        let content_type = input.content_type();

        let mut headers = HeaderMap::new();
        let mut put = |name: &'static str, value: String| -> Result<(), ExchangeError> {
            let value = HeaderValue::from_str(&value)
                .map_err(|e| ExchangeError::Signing(format!("bad {} header: {}", name, e)))?;
            headers.insert(name, value);
            Ok(())
        };
        put("x-auth", format!("{} {}", EXCHANGE.auth.prefix, credentials.key))?;
        put("x-auth-signature", signature)?;
        put("x-auth-nonce", nonce.clone())?;
        put("x-auth-timestamp", timestamp_ms.to_string())?;
        put("x-auth-version", EXCHANGE.auth.version.to_string())?;
        if !content_type.is_empty() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        self.limiter.acquire(EXCHANGE.limits.request_cost, path).await;
        if DF.log_requests {
            log::info!("POST {} (signed, {} byte body)", url, body.len());
        }

        let response = self.http.post(url).headers(headers).body(body).send().await?;
        let text = response.text().await?;
        ApiResponse::decode(&text)
    }

    fn is_retryable(e: &reqwest::Error) -> bool {
        e.is_connect() || e.is_timeout() || e.is_request()
    }

    // ── Public endpoints ────────────────────────────────────────────────

    pub async fn get_trading_pairs(&self) -> Result<ApiResponse<Vec<TradingPairInfo>>, ExchangeError> {
        self.get("trading-pairs-info/", "").await
    }

    pub async fn get_ticker(&self, pair: &TradingPair) -> Result<ApiResponse<Ticker>, ExchangeError> {
        self.get(&format!("ticker/{}/", pair.url_symbol()), "").await
    }

    pub async fn get_ohlc(&self, request: &OhlcRequest) -> Result<ApiResponse<OhlcData>, ExchangeError> {
        request.validate()?;
        let response: ApiResponse<OhlcEnvelope> =
            self.get(&request.path(), &request.query_string()?).await?;
        Ok(response.map(|envelope| envelope.data))
    }

    // ── Private endpoints ───────────────────────────────────────────────

    pub async fn get_fees(&self, pair: &TradingPair) -> Result<ApiResponse<FeeData>, ExchangeError> {
        self.post_authenticated(&format!("fees/trading/{}/", pair.url_symbol()), None)
            .await
    }

    pub async fn get_all_fees(&self) -> Result<ApiResponse<Vec<FeeData>>, ExchangeError> {
        self.post_authenticated("fees/trading/", None).await
    }

    pub async fn buy_limit_order(
        &self,
        pair: &TradingPair,
        order: &LimitOrderRequest,
    ) -> Result<ApiResponse<OrderResponse>, ExchangeError> {
        order.validate()?;
        let form = order.to_form()?;
        self.post_authenticated(&format!("buy/{}/", pair.url_symbol()), Some(form))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ExchangeClient {
        ExchangeClient::with_base_url(base, None, ExchangeApiConfig::default()).unwrap()
    }

    #[test]
    fn endpoint_keeps_api_prefix() {
        let c = client(EXCHANGE.base_url);
        let url = c.endpoint("ohlc/btcusd/", "step=60&limit=1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.bitstamp.net/api/v2/ohlc/btcusd/?step=60&limit=1"
        );
    }

    #[test]
    fn base_url_without_trailing_slash_is_fixed_up() {
        let c = client("http://127.0.0.1:8080/api/v2");
        let url = c.endpoint("ticker/btcusd/", "").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/v2/ticker/btcusd/");
    }

    #[tokio::test]
    async fn private_calls_need_credentials() {
        let c = client(EXCHANGE.base_url);
        let err = c.get_all_fees().await.unwrap_err();
        assert!(matches!(err, ExchangeError::Signing(_)));
    }

    #[tokio::test]
    async fn invalid_ohlc_request_is_rejected_before_sending() {
        let c = client("http://127.0.0.1:9/");
        let mut request = OhlcRequest::new(TradingPair::new("btcusd"), crate::domain::CandleStep::M1);
        request.limit = 5000;
        let err = c.get_ohlc(&request).await.unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidRequest(_)));
    }
}
