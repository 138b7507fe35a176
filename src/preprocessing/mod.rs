//! Raw provider rows to validated price series, and min-max scaling

pub mod scaler;

pub use scaler::{fit_transform, inverse_transform, ScaledSeries, ScalerState};

use crate::error::{PipelineError, PipelineResult};
use crate::models::series::{PricePoint, PriceSeries, RawSeries};
use tracing::debug;

/// Validate raw rows and fill missing closes (forward, then backward).
///
/// Fails with `MissingColumn` when the close column is absent, with
/// `InsufficientData` when there are no rows, and with `InvalidInput` when
/// timestamps are not strictly increasing or no close is usable at all.
pub fn preprocess(raw: &RawSeries) -> PipelineResult<PriceSeries> {
    let context = format!("{} series", raw.timeframe);
    let closes = raw.closes.as_ref().ok_or_else(|| PipelineError::MissingColumn {
        column: "close".to_string(),
        context: context.clone(),
    })?;

    if raw.is_empty() {
        return Err(PipelineError::insufficient(context, 1, 0));
    }

    if closes.len() != raw.timestamps.len() {
        return Err(PipelineError::invalid(
            context,
            format!(
                "{} timestamps but {} closes",
                raw.timestamps.len(),
                closes.len()
            ),
        ));
    }

    if let Some(pair) = raw.timestamps.windows(2).find(|w| w[1] <= w[0]) {
        return Err(PipelineError::invalid(
            context,
            format!("timestamps not strictly increasing at {}", pair[1]),
        ));
    }

    let filled = fill_gaps(closes).ok_or_else(|| {
        PipelineError::invalid(context.clone(), "no finite close values")
    })?;

    let gaps = closes
        .iter()
        .filter(|c| !matches!(c, Some(v) if v.is_finite()))
        .count();
    if gaps > 0 {
        debug!(timeframe = %raw.timeframe, gaps, "Filled {} missing closes", gaps);
    }

    let points = raw
        .timestamps
        .iter()
        .zip(filled)
        .map(|(&timestamp, close)| PricePoint { timestamp, close })
        .collect();

    Ok(PriceSeries::new_unchecked(raw.timeframe, points))
}

/// Forward-fill then back-fill missing or non-finite values
fn fill_gaps(values: &[Option<f64>]) -> Option<Vec<f64>> {
    let first_valid = values
        .iter()
        .flatten()
        .copied()
        .find(|v| v.is_finite())?;

    let mut last = None;
    let filled = values
        .iter()
        .map(|value| {
            if let Some(v) = value.filter(|v| v.is_finite()) {
                last = Some(v);
            }
            // Leading gaps take the first valid value (backward fill)
            last.unwrap_or(first_valid)
        })
        .collect();
    Some(filled)
}
