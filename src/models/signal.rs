//! Trading signal models

use crate::models::series::Timeframe;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete trading decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Signal::Buy => "Buy",
            Signal::Sell => "Sell",
            Signal::Hold => "Hold",
        };
        f.write_str(label)
    }
}

/// Signal for one timeframe, confidence in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSignal {
    pub timeframe: Timeframe,
    pub signal: Signal,
    pub confidence: f64,
    /// Tolerance band used for the decision
    pub tolerance: f64,
    pub near_fibonacci_level: bool,
}

impl TimeframeSignal {
    pub fn hold(timeframe: Timeframe, tolerance: f64, near_fibonacci_level: bool) -> Self {
        Self {
            timeframe,
            signal: Signal::Hold,
            confidence: 0.0,
            tolerance,
            near_fibonacci_level,
        }
    }
}

/// Stop-loss / take-profit pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLevels {
    pub stop_loss: f64,
    pub take_profit: f64,
}

/// Merge of the two timeframe signals plus risk levels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedSignal {
    pub signal: Signal,
    pub confidence: f64,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
}

impl CombinedSignal {
    /// Presentation label: `"Buy: 72.50%"`, `"Sell: 40.00%"` or `"Hold"`
    pub fn label(&self) -> String {
        match self.signal {
            Signal::Hold => "Hold".to_string(),
            signal => format!("{}: {:.2}%", signal, self.confidence),
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.signal != Signal::Hold
    }
}
