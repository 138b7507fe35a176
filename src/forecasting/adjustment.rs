//! Volatility-based forecast dampening

use crate::config::DampeningConfig;
use crate::indicators::volatility::simple_volatility;
use tracing::info;

/// Scale every forecast value by `factor` when `volatility` exceeds `threshold`
pub fn dampen_forecast(predictions: &[f64], volatility: f64, threshold: f64, factor: f64) -> Vec<f64> {
    if volatility > threshold {
        predictions.iter().map(|p| p * factor).collect()
    } else {
        predictions.to_vec()
    }
}

/// Apply dampening using the simple rolling volatility of `recent_prices`
pub fn apply_dampening(predictions: &[f64], recent_prices: &[f64], config: &DampeningConfig) -> Vec<f64> {
    let volatility = simple_volatility(recent_prices, config.window);
    if volatility > config.threshold {
        info!(
            volatility,
            threshold = config.threshold,
            factor = config.factor,
            "High per-period volatility (simple rolling variant): dampening forecast"
        );
    }
    dampen_forecast(predictions, volatility, config.threshold, config.factor)
}
