//! Fibonacci retracement levels and trend detection

use crate::common::math;
use crate::error::{PipelineError, PipelineResult};
use crate::models::indicators::{FibLevel, FibonacciLevels, Trend};
use std::collections::BTreeMap;

/// Classify the window: Uptrend iff the last price is above the midpoint of
/// its min and max
pub fn determine_trend(prices: &[f64]) -> PipelineResult<Trend> {
    let (low, high) = math::min_max(prices)
        .ok_or_else(|| PipelineError::insufficient("trend detection", 1, 0))?;
    let last = prices[prices.len() - 1];

    if last > (high + low) / 2.0 {
        Ok(Trend::Uptrend)
    } else {
        Ok(Trend::Downtrend)
    }
}

/// Calculate retracement levels over the window's high-low range
///
/// Uptrend: level X = low + X * range (0% is the low, 100% the high)
/// Downtrend: level X = high - X * range (0% is the high, 100% the low)
/// 50% is the midpoint in both cases.
pub fn calculate_fibonacci_levels(prices: &[f64], trend: Trend) -> PipelineResult<FibonacciLevels> {
    let (low, high) = math::min_max(prices)
        .ok_or_else(|| PipelineError::insufficient("fibonacci levels", 1, 0))?;
    Ok(levels_from_range(high, low, trend))
}

/// Levels for an explicit high/low pair
pub fn levels_from_range(high: f64, low: f64, trend: Trend) -> FibonacciLevels {
    let range = high - low;
    let levels: BTreeMap<FibLevel, f64> = FibLevel::ALL
        .iter()
        .map(|&level| {
            let price = match (level, trend) {
                (FibLevel::Half, _) => (high + low) / 2.0,
                (FibLevel::Zero, Trend::Uptrend) | (FibLevel::Full, Trend::Downtrend) => low,
                (FibLevel::Full, Trend::Uptrend) | (FibLevel::Zero, Trend::Downtrend) => high,
                (_, Trend::Uptrend) => low + level.ratio() * range,
                (_, Trend::Downtrend) => high - level.ratio() * range,
            };
            (level, price)
        })
        .collect();
    FibonacciLevels::new(levels)
}

/// Trend and levels over the trailing `lookback` prices
pub fn fibonacci_window(prices: &[f64], lookback: usize) -> PipelineResult<(Trend, FibonacciLevels)> {
    let window = math::tail(prices, lookback);
    let trend = determine_trend(window)?;
    let levels = calculate_fibonacci_levels(window, trend)?;
    Ok((trend, levels))
}
