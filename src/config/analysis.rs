//! Indicator parameters

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Extra candles kept beyond the longest indicator window.
pub const LOOKBACK_SAFETY_MARGIN: usize = 5;

/// Periods and factors for every indicator. All periods count candles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisParameters {
    pub sma_period: usize,
    pub ema_period: usize,
    pub rsi_period: usize,
    pub bollinger_bands_period: usize,
    pub bollinger_bands_multiplier: Decimal,
    pub macd_short_period: usize,
    pub macd_long_period: usize,
    pub macd_signal_period: usize,
    pub stochastic_oscillator_period: usize,
    /// OBV runs over the whole window; kept so it takes part in the longest-period check.
    pub obv_period: usize,
    pub cci_period: usize,
    pub ichimoku_cloud_tenkan_period: usize,
    pub ichimoku_cloud_kijun_period: usize,
    pub ichimoku_cloud_senkou_b_period: usize,
    pub parabolic_sar_step: Decimal,
    pub parabolic_sar_max_step: Decimal,
}

impl Default for AnalysisParameters {
    fn default() -> Self {
        Self {
            sma_period: 20,
            ema_period: 20,
            rsi_period: 14,
            bollinger_bands_period: 20,
            bollinger_bands_multiplier: Decimal::TWO,
            macd_short_period: 12,
            macd_long_period: 26,
            macd_signal_period: 9,
            stochastic_oscillator_period: 14,
            obv_period: 1,
            cci_period: 20,
            ichimoku_cloud_tenkan_period: 9,
            ichimoku_cloud_kijun_period: 26,
            ichimoku_cloud_senkou_b_period: 52,
            parabolic_sar_step: Decimal::new(2, 2),
            parabolic_sar_max_step: Decimal::new(2, 1),
        }
    }
}

impl AnalysisParameters {
    fn periods(&self) -> [(&'static str, usize); 13] {
        [
            ("sma_period", self.sma_period),
            ("ema_period", self.ema_period),
            ("rsi_period", self.rsi_period),
            ("bollinger_bands_period", self.bollinger_bands_period),
            ("macd_short_period", self.macd_short_period),
            ("macd_long_period", self.macd_long_period),
            ("macd_signal_period", self.macd_signal_period),
            ("stochastic_oscillator_period", self.stochastic_oscillator_period),
            ("obv_period", self.obv_period),
            ("cci_period", self.cci_period),
            ("ichimoku_cloud_tenkan_period", self.ichimoku_cloud_tenkan_period),
            ("ichimoku_cloud_kijun_period", self.ichimoku_cloud_kijun_period),
            ("ichimoku_cloud_senkou_b_period", self.ichimoku_cloud_senkou_b_period),
        ]
    }

    pub fn longest_period(&self) -> usize {
        self.periods().iter().map(|(_, p)| *p).max().unwrap_or(0)
    }

    /// Minimum window length the indicator engine accepts.
    pub fn required_candles(&self) -> usize {
        self.longest_period() + 1
    }

    /// Candles of history kept before the oldest analysable timestamp.
    pub fn lookback_candles(&self) -> usize {
        self.longest_period() + LOOKBACK_SAFETY_MARGIN
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some((name, _)) = self.periods().iter().find(|(_, p)| *p == 0) {
            return Err(format!("analysis.{} must be a positive integer", name));
        }
        if self.bollinger_bands_multiplier.is_sign_negative() {
            return Err("analysis.bollinger_bands_multiplier must not be negative".to_string());
        }
        if self.parabolic_sar_step <= Decimal::ZERO
            || self.parabolic_sar_max_step < self.parabolic_sar_step
        {
            return Err(
                "analysis.parabolic_sar_step must be positive and not exceed parabolic_sar_max_step"
                    .to_string(),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_driven_by_senkou_b() {
        let params = AnalysisParameters::default();
        assert_eq!(params.longest_period(), 52);
        assert_eq!(params.required_candles(), 53);
        assert_eq!(params.lookback_candles(), 57);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn zero_period_is_rejected() {
        let params = AnalysisParameters {
            cci_period: 0,
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert!(err.contains("cci_period"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params: AnalysisParameters =
            serde_json::from_str(r#"{"rsi_period": 7, "parabolic_sar_step": "0.01"}"#).unwrap();
        assert_eq!(params.rsi_period, 7);
        assert_eq!(params.parabolic_sar_step, Decimal::new(1, 2));
        assert_eq!(params.sma_period, 20);
    }
}
