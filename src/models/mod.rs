//! Shared data models spanning the engine layers.

pub mod indicators;
pub mod payload;
pub mod series;
pub mod signal;

pub use indicators::{FibLevel, FibonacciLevels, IndicatorSet, Trend};
pub use payload::{DecisionPayload, TimeframeBreakdown};
pub use series::{PricePoint, PriceSeries, RawSeries, Timeframe};
pub use signal::{CombinedSignal, RiskLevels, Signal, TimeframeSignal};
