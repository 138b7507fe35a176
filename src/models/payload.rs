//! Decision payload handed to the delivery layer

use crate::models::indicators::{FibonacciLevels, Trend};
use crate::models::series::Timeframe;
use crate::models::signal::{CombinedSignal, Signal, TimeframeSignal};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-timeframe detail kept alongside the headline decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeBreakdown {
    pub timeframe: Timeframe,
    pub signal: Signal,
    pub confidence: f64,
    pub rsi: f64,
    pub volatility: f64,
    pub trend: Trend,
    /// Last value of this timeframe's own forecast
    pub forecast_price: f64,
}

impl TimeframeBreakdown {
    pub fn new(
        signal: &TimeframeSignal,
        rsi: f64,
        volatility: f64,
        trend: Trend,
        forecast_price: f64,
    ) -> Self {
        Self {
            timeframe: signal.timeframe,
            signal: signal.signal,
            confidence: signal.confidence,
            rsi,
            volatility,
            trend,
            forecast_price,
        }
    }
}

/// Result of one pipeline run. Field names follow the dashboard's
/// `update_chart` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub prices: Vec<f64>,
    pub predicted_price: f64,
    pub predicted_prices: Vec<f64>,
    pub current_price: f64,
    pub rsi: Vec<f64>,
    pub signal: String,
    pub decision: Signal,
    pub confidence: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub fibonacci_levels: FibonacciLevels,
    pub volatility: f64,
    pub timeframes: Vec<TimeframeBreakdown>,
}

impl DecisionPayload {
    /// Headline decision without the chart data
    pub fn combined(&self) -> CombinedSignal {
        CombinedSignal {
            signal: self.decision,
            confidence: self.confidence,
            entry_price: self.entry_price,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
        }
    }
}
