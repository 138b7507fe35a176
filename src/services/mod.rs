//! Collaborators around the core: market data and append-only logs

pub mod market_data;
pub mod prediction_log;

pub use market_data::{MarketDataProvider, StaticMarketDataProvider, YahooChartProvider};
pub use prediction_log::{PredictionEntry, PredictionLog, SignalLog};
