//! Min-max scaling of a close series into [0, 1]

use crate::common::math;
use crate::error::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Fitted bounds needed to invert the scaling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub min: f64,
    pub max: f64,
}

impl ScalerState {
    /// True when the fitting window had a single distinct value
    pub fn is_degenerate(&self) -> bool {
        self.max == self.min
    }

    /// Forward map. A degenerate window maps everything to 0.0.
    pub fn transform(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (value - self.min) / (self.max - self.min)
        }
    }

    /// Exact inverse of `transform`
    pub fn inverse_transform(&self, scaled: f64) -> f64 {
        scaled * (self.max - self.min) + self.min
    }
}

/// Scaled values together with the state that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledSeries {
    pub values: Vec<f64>,
    pub scaler: ScalerState,
}

impl ScaledSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last `n` scaled points
    pub fn window(&self, n: usize) -> &[f64] {
        math::tail(&self.values, n)
    }
}

/// Fit min/max over `values` and scale every point into [0, 1]
pub fn fit_transform(values: &[f64]) -> PipelineResult<ScaledSeries> {
    let (min, max) = math::min_max(values)
        .ok_or_else(|| PipelineError::insufficient("min-max scaling", 1, 0))?;

    if !min.is_finite() || !max.is_finite() {
        return Err(PipelineError::invalid(
            "min-max scaling",
            "series contains non-finite values",
        ));
    }

    let scaler = ScalerState { min, max };
    let values = values.iter().map(|&v| scaler.transform(v)).collect();
    Ok(ScaledSeries { values, scaler })
}

/// Inverse-scale a single value
pub fn inverse_transform(state: &ScalerState, scaled: f64) -> f64 {
    state.inverse_transform(scaled)
}
