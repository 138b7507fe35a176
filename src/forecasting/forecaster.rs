//! Autoregressive multi-step forecasting

use crate::error::{PipelineError, PipelineResult};
use crate::forecasting::model::SharedModel;
use crate::preprocessing::{ScaledSeries, ScalerState};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Wraps one model with its fixed input length W and horizon H
#[derive(Clone)]
pub struct Forecaster {
    model: SharedModel,
    sequence_length: usize,
    horizon: usize,
}

impl Forecaster {
    pub fn new(model: SharedModel, sequence_length: usize, horizon: usize) -> Self {
        Self {
            model,
            sequence_length,
            horizon,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Forecast `horizon` prices from the last W scaled points.
    ///
    /// Each step's scaled prediction is pushed onto the end of the window
    /// (oldest point dropped) and fed back as input to the next step, so
    /// errors compound through the horizon. Output is inverse-scaled.
    pub fn predict(&self, scaled: &[f64], scaler: &ScalerState) -> PipelineResult<Vec<f64>> {
        let w = self.sequence_length;
        if w == 0 {
            return Err(PipelineError::invalid(
                "forecast",
                "sequence length must be positive",
            ));
        }
        if scaled.len() < w {
            return Err(PipelineError::insufficient(
                format!("forecast with {}", self.model.name()),
                w,
                scaled.len(),
            ));
        }

        let window = &scaled[scaled.len() - w..];
        if window.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::invalid(
                format!("forecast with {}", self.model.name()),
                "input window contains non-finite values",
            ));
        }

        let mut input = Array3::<f32>::zeros((1, w, 1));
        for (i, &value) in window.iter().enumerate() {
            input[[0, i, 0]] = value as f32;
        }

        let mut predictions = Vec::with_capacity(self.horizon);
        for step in 0..self.horizon {
            let output = self.model.infer(input.view())?;
            let next_scaled = output.iter().next().copied().ok_or_else(|| {
                PipelineError::Inference(format!("{} returned an empty tensor", self.model.name()))
            })?;
            if !next_scaled.is_finite() {
                return Err(PipelineError::Inference(format!(
                    "{} returned a non-finite value at step {}",
                    self.model.name(),
                    step
                )));
            }

            predictions.push(scaler.inverse_transform(next_scaled as f64));

            for i in 0..w - 1 {
                input[[0, i, 0]] = input[[0, i + 1, 0]];
            }
            input[[0, w - 1, 0]] = next_scaled;
        }

        debug!(
            model = %self.model.name(),
            horizon = self.horizon,
            last = predictions.last().copied().unwrap_or_default(),
            "Forecast complete"
        );

        Ok(predictions)
    }
}

/// Forecasts of both timeframes and their element-wise average
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiHorizonForecast {
    pub short: Vec<f64>,
    pub long: Vec<f64>,
    pub combined: Vec<f64>,
}

/// Averages the forecasts of a short-interval and a long-interval model
#[derive(Clone)]
pub struct MultiHorizonForecaster {
    short: Forecaster,
    long: Forecaster,
}

impl MultiHorizonForecaster {
    /// Both forecasters must share the same horizon.
    pub fn new(short: Forecaster, long: Forecaster) -> Self {
        assert_eq!(
            short.horizon(),
            long.horizon(),
            "short and long forecasters must share a horizon"
        );
        Self { short, long }
    }

    pub fn short(&self) -> &Forecaster {
        &self.short
    }

    pub fn long(&self) -> &Forecaster {
        &self.long
    }

    pub fn predict(
        &self,
        short_series: &ScaledSeries,
        long_series: &ScaledSeries,
    ) -> PipelineResult<MultiHorizonForecast> {
        let short = self.short.predict(&short_series.values, &short_series.scaler)?;
        let long = self.long.predict(&long_series.values, &long_series.scaler)?;

        assert_eq!(short.len(), long.len(), "forecast horizons diverged");

        let combined = short
            .iter()
            .zip(&long)
            .map(|(s, l)| (s + l) / 2.0)
            .collect();

        Ok(MultiHorizonForecast {
            short,
            long,
            combined,
        })
    }
}
