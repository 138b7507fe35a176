//! Price series models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sampling interval of a price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    FifteenMinute,
    #[serde(rename = "1h")]
    Hourly,
}

impl Timeframe {
    /// Provider interval code
    pub fn interval(&self) -> &'static str {
        match self {
            Timeframe::FifteenMinute => "15m",
            Timeframe::Hourly => "1h",
        }
    }

    /// History range requested from the provider
    pub fn range(&self) -> &'static str {
        match self {
            Timeframe::FifteenMinute => "30d",
            Timeframe::Hourly => "3mo",
        }
    }

    /// Annualization factor for volatility
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Timeframe::FifteenMinute => (365 * 24 * 12) as f64,
            Timeframe::Hourly => (365 * 24) as f64,
        }
    }

    /// Bars used for Fibonacci retracement: 7 days of 15m bars, 30 days of 1h bars
    pub fn fibonacci_lookback(&self) -> usize {
        match self {
            Timeframe::FifteenMinute => 7 * 24 * 4,
            Timeframe::Hourly => 30 * 24,
        }
    }

    /// `model_type` column of the prediction log
    pub fn model_label(&self) -> &'static str {
        match self {
            Timeframe::FifteenMinute => "15-minute",
            Timeframe::Hourly => "Hourly",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interval())
    }
}

/// One (timestamp, close) observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Rows as delivered by a market data provider: closes may be missing,
/// and the close column itself may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSeries {
    pub timeframe: Timeframe,
    pub timestamps: Vec<DateTime<Utc>>,
    pub closes: Option<Vec<Option<f64>>>,
}

impl RawSeries {
    pub fn new(timeframe: Timeframe, timestamps: Vec<DateTime<Utc>>, closes: Vec<Option<f64>>) -> Self {
        Self {
            timeframe,
            timestamps,
            closes: Some(closes),
        }
    }

    /// Build from complete observations
    pub fn from_points(timeframe: Timeframe, points: &[PricePoint]) -> Self {
        Self::new(
            timeframe,
            points.iter().map(|p| p.timestamp).collect(),
            points.iter().map(|p| Some(p.close)).collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Ordered, gap-free close series with strictly increasing timestamps.
///
/// Only constructed through `preprocessing::preprocess`, which enforces the
/// ordering invariant, or `PriceSeries::from_points` which checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    timeframe: Timeframe,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub(crate) fn new_unchecked(timeframe: Timeframe, points: Vec<PricePoint>) -> Self {
        Self { timeframe, points }
    }

    /// Validate ordering and build the series
    pub fn from_points(
        timeframe: Timeframe,
        points: Vec<PricePoint>,
    ) -> Result<Self, crate::error::PipelineError> {
        let raw = RawSeries::from_points(timeframe, &points);
        crate::preprocessing::preprocess(&raw)
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }
}
