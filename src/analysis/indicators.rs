//! Technical indicators over a candle slice ordered oldest to newest.
//!
//! Every function looks at the trailing end of the slice (the candle being
//! analysed is the last one) and works in exact decimal arithmetic. A slice
//! shorter than the indicator needs yields [`IndicatorError::InsufficientData`].

use {
    super::result::{BollingerBands, IchimokuCloud, Macd, StochasticOscillator},
    crate::{
        domain::Candle,
        error::IndicatorError,
        utils::{mean, mean_abs_deviation, mean_and_std_dev, midpoint},
    },
    itertools::Itertools,
    rust_decimal::Decimal,
};

type IndicatorResult<T> = Result<T, IndicatorError>;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Lambert's constant: scales CCI so most values fall within ±100.
const CCI_CONSTANT: Decimal = Decimal::from_parts(15, 0, 0, false, 3);

fn check_period(indicator: &'static str, period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter {
            indicator,
            reason: "period must be positive".to_string(),
        });
    }
    Ok(())
}

fn require(indicator: &'static str, candles: &[Candle], required: usize) -> IndicatorResult<()> {
    if candles.len() < required {
        return Err(IndicatorError::InsufficientData {
            indicator,
            required,
            available: candles.len(),
        });
    }
    Ok(())
}

fn trailing(candles: &[Candle], period: usize) -> &[Candle] {
    &candles[candles.len().saturating_sub(period)..]
}

fn last<'a>(indicator: &'static str, candles: &'a [Candle]) -> IndicatorResult<&'a Candle> {
    candles.last().ok_or(IndicatorError::InsufficientData {
        indicator,
        required: 1,
        available: 0,
    })
}

fn closes(candles: &[Candle]) -> Vec<Decimal> {
    candles.iter().map(|c| c.close).collect()
}

fn highest_high(candles: &[Candle]) -> Decimal {
    candles.iter().map(|c| c.high).max().unwrap_or_default()
}

fn lowest_low(candles: &[Candle]) -> Decimal {
    candles.iter().map(|c| c.low).min().unwrap_or_default()
}

fn overflow(indicator: &'static str) -> IndicatorError {
    IndicatorError::Overflow { indicator }
}

/// Mean close of the trailing `period` candles.
pub fn sma(candles: &[Candle], period: usize) -> IndicatorResult<Decimal> {
    const NAME: &str = "SMA";
    check_period(NAME, period)?;
    require(NAME, candles, period)?;
    mean(&closes(trailing(candles, period))).ok_or_else(|| overflow(NAME))
}

/// Seeded with the SMA of the first `period` candles, then smoothed over every
/// following candle up to and including the last.
pub fn ema(candles: &[Candle], period: usize) -> IndicatorResult<Decimal> {
    const NAME: &str = "EMA";
    check_period(NAME, period)?;
    require(NAME, candles, period)?;

    let multiplier = Decimal::TWO / Decimal::from(period + 1);
    let seed = mean(&closes(&candles[..period])).ok_or_else(|| overflow(NAME))?;

    Ok(candles[period..]
        .iter()
        .fold(seed, |prev, c| (c.close - prev) * multiplier + prev))
}

/// RSI from plain sums of gains and losses over the trailing `period` close-to-close changes.
pub fn rsi(candles: &[Candle], period: usize) -> IndicatorResult<Decimal> {
    const NAME: &str = "RSI";
    check_period(NAME, period)?;
    require(NAME, candles, period + 1)?;

    let (gain, loss) = trailing(candles, period + 1)
        .iter()
        .tuple_windows()
        .map(|(prev, cur)| cur.close - prev.close)
        .fold((Decimal::ZERO, Decimal::ZERO), |(gain, loss), change| {
            if change > Decimal::ZERO {
                (gain + change, loss)
            } else {
                (gain, loss - change)
            }
        });

    if loss.is_zero() {
        return Ok(HUNDRED);
    }
    // Averages share the same divisor, so the ratio of sums is the ratio of averages.
    let rs = gain.checked_div(loss).ok_or_else(|| overflow(NAME))?;
    Ok(HUNDRED - HUNDRED / (Decimal::ONE + rs))
}

/// SMA ± `multiplier` population standard deviations.
pub fn bollinger_bands(
    candles: &[Candle],
    period: usize,
    multiplier: Decimal,
) -> IndicatorResult<BollingerBands> {
    const NAME: &str = "Bollinger Bands";
    check_period(NAME, period)?;
    require(NAME, candles, period)?;

    let (middle, std_dev) =
        mean_and_std_dev(&closes(trailing(candles, period))).ok_or_else(|| overflow(NAME))?;
    let width = multiplier * std_dev;
    Ok(BollingerBands {
        upper: middle + width,
        middle,
        lower: middle - width,
    })
}

/// MACD line at the last candle, its signal (SMA of the MACD line over the
/// trailing `signal` candles) and the histogram.
pub fn macd(
    candles: &[Candle],
    short: usize,
    long: usize,
    signal: usize,
) -> IndicatorResult<Macd> {
    const NAME: &str = "MACD";
    check_period(NAME, short)?;
    check_period(NAME, long)?;
    check_period(NAME, signal)?;
    let longest = short.max(long);
    require(NAME, candles, longest + signal - 1)?;

    let line_at = |end: usize| -> IndicatorResult<Decimal> {
        let prefix = &candles[..end];
        Ok(ema(prefix, short)? - ema(prefix, long)?)
    };

    let line = (candles.len() + 1 - signal..=candles.len())
        .map(line_at)
        .collect::<IndicatorResult<Vec<Decimal>>>()?;

    let macd = *line.last().ok_or_else(|| overflow(NAME))?;
    let signal = mean(&line).ok_or_else(|| overflow(NAME))?;
    Ok(Macd {
        macd,
        signal,
        histogram: macd - signal,
    })
}

/// %K of the last close within the trailing high/low range, and %D as the mean
/// %K of every close in that window against the same range. A flat range gives 0.
pub fn stochastic_oscillator(
    candles: &[Candle],
    period: usize,
) -> IndicatorResult<StochasticOscillator> {
    const NAME: &str = "Stochastic Oscillator";
    check_period(NAME, period)?;
    require(NAME, candles, period)?;

    let window = trailing(candles, period);
    let low = lowest_low(window);
    let range = highest_high(window) - low;
    if range.is_zero() {
        return Ok(StochasticOscillator {
            k: Decimal::ZERO,
            d: Decimal::ZERO,
        });
    }

    let percent_k = |close: Decimal| HUNDRED * (close - low) / range;
    let k = percent_k(last(NAME, window)?.close);
    let ks: Vec<Decimal> = window.iter().map(|c| percent_k(c.close)).collect();
    let d = mean(&ks).ok_or_else(|| overflow(NAME))?;
    Ok(StochasticOscillator { k, d })
}

/// On-balance volume accumulated over the whole slice.
pub fn obv(candles: &[Candle]) -> IndicatorResult<Decimal> {
    const NAME: &str = "OBV";
    require(NAME, candles, 1)?;

    Ok(candles
        .iter()
        .tuple_windows()
        .fold(Decimal::ZERO, |acc, (prev, cur)| {
            if cur.close > prev.close {
                acc + cur.volume
            } else if cur.close < prev.close {
                acc - cur.volume
            } else {
                acc
            }
        }))
}

/// Commodity channel index of the last typical price. Zero mean deviation gives 0.
pub fn cci(candles: &[Candle], period: usize) -> IndicatorResult<Decimal> {
    const NAME: &str = "CCI";
    check_period(NAME, period)?;
    require(NAME, candles, period)?;

    let window = trailing(candles, period);
    let typical: Vec<Decimal> = window.iter().map(Candle::typical_price).collect();
    let average = mean(&typical).ok_or_else(|| overflow(NAME))?;
    let deviation = mean_abs_deviation(&typical, average).ok_or_else(|| overflow(NAME))?;
    if deviation.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let current = last(NAME, window)?.typical_price();
    (current - average)
        .checked_div(CCI_CONSTANT * deviation)
        .ok_or_else(|| overflow(NAME))
}

/// Tenkan/kijun/senkou-B midpoints over their windows; chikou is the close
/// `tenkan` candles back from the end (counting the last candle as 1).
pub fn ichimoku_cloud(
    candles: &[Candle],
    tenkan: usize,
    kijun: usize,
    senkou_b: usize,
) -> IndicatorResult<IchimokuCloud> {
    const NAME: &str = "Ichimoku Cloud";
    check_period(NAME, tenkan)?;
    check_period(NAME, kijun)?;
    check_period(NAME, senkou_b)?;
    require(NAME, candles, tenkan.max(kijun).max(senkou_b))?;

    let mid_of = |period: usize| {
        let window = trailing(candles, period);
        midpoint(highest_high(window), lowest_low(window))
    };
    let tenkan_sen = mid_of(tenkan);
    let kijun_sen = mid_of(kijun);

    Ok(IchimokuCloud {
        tenkan_sen,
        kijun_sen,
        senkou_span_a: midpoint(tenkan_sen, kijun_sen),
        senkou_span_b: mid_of(senkou_b),
        chikou_span: candles[candles.len() - tenkan].close,
    })
}

/// Wilder's parabolic SAR after walking the whole slice.
///
/// The initial trend follows the first two closes. On a breach the SAR jumps to
/// the prior extreme point and the acceleration factor resets to `step`.
pub fn parabolic_sar(candles: &[Candle], step: Decimal, max_step: Decimal) -> IndicatorResult<Decimal> {
    const NAME: &str = "Parabolic SAR";
    if step <= Decimal::ZERO || max_step < step {
        return Err(IndicatorError::InvalidParameter {
            indicator: NAME,
            reason: format!("step {} must be positive and not exceed max step {}", step, max_step),
        });
    }
    require(NAME, candles, 2)?;

    let first = &candles[0];
    let mut rising = candles[1].close >= first.close;
    let (mut sar, mut extreme) = if rising {
        (first.low, first.high)
    } else {
        (first.high, first.low)
    };
    let mut af = step;

    for i in 1..candles.len() {
        let cur = &candles[i];
        let prev = &candles[i - 1];
        let prev2 = i.checked_sub(2).map(|j| &candles[j]);
        let mut next = sar + af * (extreme - sar);

        if rising {
            // Never above the two prior lows
            next = next.min(prev.low);
            if let Some(p) = prev2 {
                next = next.min(p.low);
            }
            if cur.low < next {
                rising = false;
                next = extreme;
                extreme = cur.low;
                af = step;
            } else if cur.high > extreme {
                extreme = cur.high;
                af = (af + step).min(max_step);
            }
        } else {
            // Never below the two prior highs
            next = next.max(prev.high);
            if let Some(p) = prev2 {
                next = next.max(p.high);
            }
            if cur.high > next {
                rising = true;
                next = extreme;
                extreme = cur.high;
                af = step;
            } else if cur.low < extreme {
                extreme = cur.low;
                af = (af + step).min(max_step);
            }
        }
        sar = next;
    }

    Ok(sar)
}

/// Balance of power of the last candle. A zero range gives 0.
pub fn bop(candles: &[Candle]) -> IndicatorResult<Decimal> {
    const NAME: &str = "BOP";
    let latest = last(NAME, candles)?;
    let range = latest.range();
    if range.is_zero() {
        return Ok(Decimal::ZERO);
    }
    (latest.close - latest.open)
        .checked_div(range)
        .ok_or_else(|| overflow(NAME))
}
