//! Technical indicators and the engine that bundles them per candle.

pub mod indicators;
mod indicator_engine;
mod result;

pub use indicator_engine::IndicatorEngine;
pub use result::{
    ANALYSIS_FIELDS, AnalysisResult, BollingerBands, IchimokuCloud, Macd, StochasticOscillator,
};
