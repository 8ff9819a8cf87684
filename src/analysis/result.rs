use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: Decimal,
    pub middle: Decimal,
    pub lower: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Macd {
    pub macd: Decimal,
    pub signal: Decimal,
    pub histogram: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StochasticOscillator {
    pub k: Decimal,
    pub d: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IchimokuCloud {
    pub tenkan_sen: Decimal,
    pub kijun_sen: Decimal,
    pub senkou_span_a: Decimal,
    pub senkou_span_b: Decimal,
    pub chikou_span: Decimal,
}

/// Column names of a stored analysis row, in storage order.
pub const ANALYSIS_FIELDS: [&str; 20] = [
    "sma",
    "ema",
    "rsi",
    "bollinger_bands_upper",
    "bollinger_bands_middle",
    "bollinger_bands_lower",
    "macd",
    "macd_signal",
    "macd_histogram",
    "stochastic_oscillator_k",
    "stochastic_oscillator_d",
    "obv",
    "cci",
    "ichimoku_cloud_tenkan_sen",
    "ichimoku_cloud_kijun_sen",
    "ichimoku_cloud_senkou_span_a",
    "ichimoku_cloud_senkou_span_b",
    "ichimoku_cloud_chikou_span",
    "parabolic_sar",
    "bop",
];

/// All indicators for one candle. `None` marks an indicator that could not be computed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub pair: String,
    pub timestamp: i64,
    pub sma: Option<Decimal>,
    pub ema: Option<Decimal>,
    pub rsi: Option<Decimal>,
    pub bollinger_bands: Option<BollingerBands>,
    pub macd: Option<Macd>,
    pub stochastic_oscillator: Option<StochasticOscillator>,
    pub obv: Option<Decimal>,
    pub cci: Option<Decimal>,
    pub ichimoku_cloud: Option<IchimokuCloud>,
    pub parabolic_sar: Option<Decimal>,
    pub bop: Option<Decimal>,
}

impl AnalysisResult {
    pub fn empty(pair: impl Into<String>, timestamp: i64) -> Self {
        Self {
            pair: pair.into(),
            timestamp,
            ..Default::default()
        }
    }

    /// Flat `(column, value)` view, aligned with [`ANALYSIS_FIELDS`].
    pub fn fields(&self) -> [(&'static str, Option<Decimal>); 20] {
        let bb = self.bollinger_bands;
        let macd = self.macd;
        let stoch = self.stochastic_oscillator;
        let ichimoku = self.ichimoku_cloud;
        let values = [
            self.sma,
            self.ema,
            self.rsi,
            bb.map(|b| b.upper),
            bb.map(|b| b.middle),
            bb.map(|b| b.lower),
            macd.map(|m| m.macd),
            macd.map(|m| m.signal),
            macd.map(|m| m.histogram),
            stoch.map(|s| s.k),
            stoch.map(|s| s.d),
            self.obv,
            self.cci,
            ichimoku.map(|i| i.tenkan_sen),
            ichimoku.map(|i| i.kijun_sen),
            ichimoku.map(|i| i.senkou_span_a),
            ichimoku.map(|i| i.senkou_span_b),
            ichimoku.map(|i| i.chikou_span),
            self.parabolic_sar,
            self.bop,
        ];
        let mut out = [("", None); 20];
        for (slot, (name, value)) in out.iter_mut().zip(ANALYSIS_FIELDS.into_iter().zip(values)) {
            *slot = (name, value);
        }
        out
    }

    /// Inverse of [`fields`](Self::fields). A composite is restored only when all its parts are present.
    pub fn from_fields(
        pair: impl Into<String>,
        timestamp: i64,
        value_of: impl Fn(&str) -> Option<Decimal>,
    ) -> Self {
        let bollinger_bands = match (
            value_of("bollinger_bands_upper"),
            value_of("bollinger_bands_middle"),
            value_of("bollinger_bands_lower"),
        ) {
            (Some(upper), Some(middle), Some(lower)) => Some(BollingerBands {
                upper,
                middle,
                lower,
            }),
            _ => None,
        };
        let macd = match (
            value_of("macd"),
            value_of("macd_signal"),
            value_of("macd_histogram"),
        ) {
            (Some(macd), Some(signal), Some(histogram)) => Some(Macd {
                macd,
                signal,
                histogram,
            }),
            _ => None,
        };
        let stochastic_oscillator = match (
            value_of("stochastic_oscillator_k"),
            value_of("stochastic_oscillator_d"),
        ) {
            (Some(k), Some(d)) => Some(StochasticOscillator { k, d }),
            _ => None,
        };
        let ichimoku_cloud = match (
            value_of("ichimoku_cloud_tenkan_sen"),
            value_of("ichimoku_cloud_kijun_sen"),
            value_of("ichimoku_cloud_senkou_span_a"),
            value_of("ichimoku_cloud_senkou_span_b"),
            value_of("ichimoku_cloud_chikou_span"),
        ) {
            (Some(tenkan_sen), Some(kijun_sen), Some(senkou_span_a), Some(senkou_span_b), Some(chikou_span)) => {
                Some(IchimokuCloud {
                    tenkan_sen,
                    kijun_sen,
                    senkou_span_a,
                    senkou_span_b,
                    chikou_span,
                })
            }
            _ => None,
        };

        Self {
            pair: pair.into(),
            timestamp,
            sma: value_of("sma"),
            ema: value_of("ema"),
            rsi: value_of("rsi"),
            bollinger_bands,
            macd,
            stochastic_oscillator,
            obv: value_of("obv"),
            cci: value_of("cci"),
            ichimoku_cloud,
            parabolic_sar: value_of("parabolic_sar"),
            bop: value_of("bop"),
        }
    }

    /// Number of stored columns that carry a value.
    pub fn available_count(&self) -> usize {
        self.fields().iter().filter(|(_, v)| v.is_some()).count()
    }
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} @ {}", self.pair, self.timestamp)?;
        for (name, value) in self.fields() {
            match value {
                Some(v) => writeln!(f, "  {:<30} {}", name, v.round_dp(8))?,
                None => writeln!(f, "  {:<30} n/a", name)?,
            }
        }
        Ok(())
    }
}
