//! Price forecasting on top of pretrained sequence models

pub mod adjustment;
pub mod forecaster;
pub mod lstm;
pub mod model;

pub use adjustment::{apply_dampening, dampen_forecast};
pub use forecaster::{Forecaster, MultiHorizonForecast, MultiHorizonForecaster};
pub use lstm::{LstmExport, LstmLayerExport, LstmRegressor};
pub use model::{SequenceModel, SharedModel};
