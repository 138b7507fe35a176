use crate::models::series::Timeframe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Binary trend classification over the Fibonacci window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Uptrend,
    Downtrend,
}

impl Trend {
    pub fn is_uptrend(&self) -> bool {
        matches!(self, Trend::Uptrend)
    }
}

/// Fibonacci retracement level labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FibLevel {
    #[serde(rename = "0%")]
    Zero,
    #[serde(rename = "23.6%")]
    Level236,
    #[serde(rename = "38.2%")]
    Level382,
    #[serde(rename = "50%")]
    Half,
    #[serde(rename = "61.8%")]
    Level618,
    #[serde(rename = "100%")]
    Full,
}

impl FibLevel {
    pub const ALL: [FibLevel; 6] = [
        FibLevel::Zero,
        FibLevel::Level236,
        FibLevel::Level382,
        FibLevel::Half,
        FibLevel::Level618,
        FibLevel::Full,
    ];

    pub fn ratio(&self) -> f64 {
        match self {
            FibLevel::Zero => 0.0,
            FibLevel::Level236 => 0.236,
            FibLevel::Level382 => 0.382,
            FibLevel::Half => 0.5,
            FibLevel::Level618 => 0.618,
            FibLevel::Full => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FibLevel::Zero => "0%",
            FibLevel::Level236 => "23.6%",
            FibLevel::Level382 => "38.2%",
            FibLevel::Half => "50%",
            FibLevel::Level618 => "61.8%",
            FibLevel::Full => "100%",
        }
    }
}

/// Level label to price mapping; serializes as `{"0%": .., "23.6%": .., ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FibonacciLevels(BTreeMap<FibLevel, f64>);

impl FibonacciLevels {
    pub fn new(levels: BTreeMap<FibLevel, f64>) -> Self {
        Self(levels)
    }

    pub fn get(&self, level: FibLevel) -> Option<f64> {
        self.0.get(&level).copied()
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.values().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FibLevel, f64)> + '_ {
        self.0.iter().map(|(level, price)| (*level, *price))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Derived values for one price series, recomputed every run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub timeframe: Timeframe,
    pub rsi: Vec<f64>,
    /// Annualized volatility
    pub volatility: f64,
    pub trend: Trend,
    pub fibonacci_levels: FibonacciLevels,
}

impl IndicatorSet {
    pub fn last_rsi(&self) -> Option<f64> {
        self.rsi.last().copied()
    }
}
