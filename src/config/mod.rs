//! Configuration: environment lookups and pipeline thresholds

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_SYMBOL: &str = "ETH-USD";
pub const DEFAULT_MARKET_DATA_URL: &str = "https://query1.finance.yahoo.com";

/// Current deployment environment (`APP_ENV`), `sandbox` when unset
pub fn get_environment() -> String {
    env::var("APP_ENV").unwrap_or_else(|_| "sandbox".to_string())
}

pub fn get_market_data_url() -> String {
    env::var("MARKET_DATA_URL").unwrap_or_else(|_| DEFAULT_MARKET_DATA_URL.to_string())
}

/// Process-level settings read from the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub symbol: String,
    pub short_model_path: PathBuf,
    pub long_model_path: PathBuf,
    pub port: u16,
    pub evaluation_interval_seconds: u64,
    pub prediction_log_path: PathBuf,
    pub signal_log_path: PathBuf,
    pub market_data_url: String,
    /// Opt-in forecast dampening (`FORECAST_DAMPENING=true`)
    pub forecast_dampening: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            short_model_path: PathBuf::from("models/eth_usd_lstm_15min.json"),
            long_model_path: PathBuf::from("models/eth_usd_lstm_hourly.json"),
            port: 8080,
            evaluation_interval_seconds: 0,
            prediction_log_path: PathBuf::from("models/prediction_log.csv"),
            signal_log_path: PathBuf::from("models/signal_log.csv"),
            market_data_url: DEFAULT_MARKET_DATA_URL.to_string(),
            forecast_dampening: false,
        }
    }
}

impl AppConfig {
    /// Build from environment variables, falling back to defaults for unset keys
    pub fn from_env() -> Result<Self, ServiceError> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ServiceError::Config(format!("PORT is not a valid port: {}", raw)))?,
            Err(_) => defaults.port,
        };

        let evaluation_interval_seconds = match env::var("EVAL_INTERVAL_SECONDS") {
            Ok(raw) => raw.parse().map_err(|_| {
                ServiceError::Config(format!("EVAL_INTERVAL_SECONDS is not a number: {}", raw))
            })?,
            Err(_) => defaults.evaluation_interval_seconds,
        };

        Ok(Self {
            symbol: env::var("SYMBOL").unwrap_or(defaults.symbol),
            short_model_path: env::var("MODEL_15MIN_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.short_model_path),
            long_model_path: env::var("MODEL_HOURLY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.long_model_path),
            port,
            evaluation_interval_seconds,
            prediction_log_path: env::var("PREDICTION_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.prediction_log_path),
            signal_log_path: env::var("SIGNAL_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.signal_log_path),
            market_data_url: get_market_data_url(),
            forecast_dampening: env::var("FORECAST_DAMPENING")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.forecast_dampening),
        })
    }

    /// Pipeline thresholds, with dampening switched on when configured
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            dampening: self.forecast_dampening.then(DampeningConfig::default),
            ..PipelineConfig::default()
        }
    }
}

/// Optional post-forecast dampening driven by the simplified rolling volatility
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DampeningConfig {
    pub window: usize,
    pub threshold: f64,
    pub factor: f64,
}

impl Default for DampeningConfig {
    fn default() -> Self {
        Self {
            window: 5,
            threshold: 0.02,
            factor: 0.95,
        }
    }
}

/// Tunable thresholds of the signal pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Model input length W
    pub sequence_length: usize,
    /// Forecast horizon H
    pub horizon: usize,
    pub rsi_window: usize,
    pub volatility_window: usize,
    pub rsi_overbought: f64,
    pub rsi_oversold: f64,
    pub base_tolerance: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dampening: Option<DampeningConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sequence_length: 59,
            horizon: 60,
            rsi_window: 14,
            volatility_window: 5,
            rsi_overbought: 70.0,
            rsi_oversold: 30.0,
            base_tolerance: 0.005,
            stop_loss_pct: 0.02,
            take_profit_pct: 0.05,
            dampening: None,
        }
    }
}
