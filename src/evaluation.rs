//! Forecast accuracy over the prediction log

use crate::services::prediction_log::PredictionEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastMetrics {
    /// Rows with a known actual price
    pub count: usize,
    pub mae: f64,
    pub rmse: f64,
    /// Percent; rows with an actual price of zero are excluded
    pub mape: f64,
}

/// Error metrics over entries whose actual price is known.
/// `None` when no entry has one.
pub fn evaluate_predictions(entries: &[PredictionEntry]) -> Option<ForecastMetrics> {
    let pairs: Vec<(f64, f64)> = entries
        .iter()
        .filter_map(|e| e.actual_price.map(|actual| (actual, e.predicted_price)))
        .filter(|(a, p)| a.is_finite() && p.is_finite())
        .collect();

    if pairs.is_empty() {
        return None;
    }

    let n = pairs.len() as f64;
    let mae = pairs.iter().map(|(a, p)| (a - p).abs()).sum::<f64>() / n;
    let rmse = (pairs.iter().map(|(a, p)| (a - p).powi(2)).sum::<f64>() / n).sqrt();

    let relative: Vec<f64> = pairs
        .iter()
        .filter(|(a, _)| *a != 0.0)
        .map(|(a, p)| ((a - p) / a).abs())
        .collect();
    let mape = if relative.is_empty() {
        0.0
    } else {
        relative.iter().sum::<f64>() / relative.len() as f64 * 100.0
    };

    Some(ForecastMetrics {
        count: pairs.len(),
        mae,
        rmse,
        mape,
    })
}

/// Metrics per `model_type`
pub fn evaluate_by_model(entries: &[PredictionEntry]) -> BTreeMap<String, ForecastMetrics> {
    let mut grouped: BTreeMap<String, Vec<PredictionEntry>> = BTreeMap::new();
    for entry in entries {
        grouped
            .entry(entry.model_type.clone())
            .or_default()
            .push(entry.clone());
    }

    grouped
        .into_iter()
        .filter_map(|(model, rows)| evaluate_predictions(&rows).map(|m| (model, m)))
        .collect()
}

/// Percent of steps where the forecast moved in the same direction as the
/// actual series. `None` with fewer than two aligned points.
pub fn directional_accuracy(actual: &[f64], predicted: &[f64]) -> Option<f64> {
    let n = actual.len().min(predicted.len());
    if n < 2 {
        return None;
    }

    let hits = (1..n)
        .filter(|&i| {
            let actual_move = (actual[i] - actual[i - 1]).signum();
            let predicted_move = (predicted[i] - predicted[i - 1]).signum();
            actual_move == predicted_move
        })
        .count();

    Some(hits as f64 / (n - 1) as f64 * 100.0)
}
