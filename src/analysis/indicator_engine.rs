use {
    super::{indicators, result::AnalysisResult},
    crate::{
        config::{AnalysisParameters, DF},
        domain::CandleSeries,
        error::IndicatorError,
        utils::epoch_sec_to_utc,
    },
};

/// Computes the full indicator set for the last candle of a window.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    params: AnalysisParameters,
}

impl IndicatorEngine {
    pub fn new(params: AnalysisParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &AnalysisParameters {
        &self.params
    }

    /// Candles a window must hold before [`analyze`](Self::analyze) accepts it.
    pub fn required_candles(&self) -> usize {
        self.params.required_candles()
    }

    /// Analyses the last candle of `window`.
    ///
    /// Fails only when the window is shorter than [`required_candles`](Self::required_candles).
    /// An indicator that cannot be computed on its own is left as `None`.
    pub fn analyze(&self, pair: &str, window: &CandleSeries) -> Result<AnalysisResult, IndicatorError> {
        let required = self.required_candles();
        let Some(timestamp) = window.last_timestamp().filter(|_| window.len() >= required) else {
            return Err(IndicatorError::InsufficientData {
                indicator: "analysis window",
                required,
                available: window.len(),
            });
        };

        let p = &self.params;
        let candles: &[_] = window;
        let at = epoch_sec_to_utc(timestamp);
        let keep = |value| Self::keep(pair, &at, value);

        let result = AnalysisResult {
            pair: pair.to_string(),
            timestamp,
            sma: keep(indicators::sma(candles, p.sma_period)),
            ema: keep(indicators::ema(candles, p.ema_period)),
            rsi: keep(indicators::rsi(candles, p.rsi_period)),
            bollinger_bands: Self::keep(
                pair,
                &at,
                indicators::bollinger_bands(
                    candles,
                    p.bollinger_bands_period,
                    p.bollinger_bands_multiplier,
                ),
            ),
            macd: Self::keep(
                pair,
                &at,
                indicators::macd(
                    candles,
                    p.macd_short_period,
                    p.macd_long_period,
                    p.macd_signal_period,
                ),
            ),
            stochastic_oscillator: Self::keep(
                pair,
                &at,
                indicators::stochastic_oscillator(candles, p.stochastic_oscillator_period),
            ),
            obv: keep(indicators::obv(candles)),
            cci: keep(indicators::cci(candles, p.cci_period)),
            ichimoku_cloud: Self::keep(
                pair,
                &at,
                indicators::ichimoku_cloud(
                    candles,
                    p.ichimoku_cloud_tenkan_period,
                    p.ichimoku_cloud_kijun_period,
                    p.ichimoku_cloud_senkou_b_period,
                ),
            ),
            parabolic_sar: keep(indicators::parabolic_sar(
                candles,
                p.parabolic_sar_step,
                p.parabolic_sar_max_step,
            )),
            bop: keep(indicators::bop(candles)),
        };

        if DF.log_analysis {
            log::info!("Analysis {}", result);
        }
        Ok(result)
    }

    fn keep<T>(pair: &str, at: &str, value: Result<T, IndicatorError>) -> Option<T> {
        match value {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("{} {}: {}", pair, at, e);
                None
            }
        }
    }
}
