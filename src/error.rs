//! Error types for the signal pipeline and its collaborators
//!
//! `PipelineError` covers local validation failures raised inside the core
//! (scaling, indicators, forecasting, synthesis). `ServiceError` wraps those
//! together with the I/O, HTTP and serialization failures of the services
//! around the core.

use thiserror::Error;

/// Failures raised by the signal-generation core.
///
/// A min == max scaling window is not an error: the scaler maps it to a
/// constant instead of dividing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Series is shorter than the component's minimum length
    #[error("Insufficient data for {context}: need at least {required} points, got {actual}")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    /// Required price field is absent from the input rows
    #[error("Missing column '{column}' in {context}")]
    MissingColumn { column: String, context: String },

    /// Non-finite or otherwise unusable values reached a component
    #[error("Invalid input for {context}: {reason}")]
    InvalidInput { context: String, reason: String },

    /// Model artifact could not be read or is inconsistent
    #[error("Failed to load model from {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    /// Model returned an unusable tensor
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl PipelineError {
    pub fn insufficient(context: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            actual,
        }
    }

    pub fn invalid(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

/// Failures raised by the services wrapped around the core
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed log row: {0}")]
    LogFormat(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Evaluation task failed: {0}")]
    Task(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
pub type ServiceResult<T> = Result<T, ServiceError>;
