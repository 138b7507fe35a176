//! Two-timeframe decision merge and risk levels

use crate::config::PipelineConfig;
use crate::models::signal::{CombinedSignal, RiskLevels, Signal, TimeframeSignal};

/// Unanimous agreement rule: act only when both timeframes agree
pub fn combine_decisions(short: Signal, long: Signal) -> Signal {
    match (short, long) {
        (Signal::Buy, Signal::Buy) => Signal::Buy,
        (Signal::Sell, Signal::Sell) => Signal::Sell,
        _ => Signal::Hold,
    }
}

/// Mean of the two confidences, whether or not the signals agree
pub fn combined_confidence(short: f64, long: f64) -> f64 {
    (short + long) / 2.0
}

pub struct DecisionCombiner {
    stop_loss_pct: f64,
    take_profit_pct: f64,
}

impl DecisionCombiner {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            stop_loss_pct: config.stop_loss_pct,
            take_profit_pct: config.take_profit_pct,
        }
    }

    /// Merge both timeframe signals; `volatility` is the mean of the two
    /// timeframes' annualized volatilities.
    pub fn combine(
        &self,
        short: &TimeframeSignal,
        long: &TimeframeSignal,
        current_price: f64,
        volatility: f64,
    ) -> CombinedSignal {
        let signal = combine_decisions(short.signal, long.signal);
        let confidence = combined_confidence(short.confidence, long.confidence);
        let entry_price = (signal != Signal::Hold).then_some(current_price);
        let risk = self.stop_loss_take_profit(entry_price, signal, volatility);

        CombinedSignal {
            signal,
            confidence,
            entry_price,
            stop_loss: risk.map(|r| r.stop_loss),
            take_profit: risk.map(|r| r.take_profit),
        }
    }

    /// Volatility-widened stop-loss and take-profit around the entry.
    /// `None` for Hold or a missing entry price.
    pub fn stop_loss_take_profit(
        &self,
        entry_price: Option<f64>,
        signal: Signal,
        volatility: f64,
    ) -> Option<RiskLevels> {
        let entry = entry_price?;
        let stop = self.stop_loss_pct * (1.0 + volatility);
        let take = self.take_profit_pct * (1.0 + volatility);

        match signal {
            Signal::Buy => Some(RiskLevels {
                stop_loss: entry * (1.0 - stop),
                take_profit: entry * (1.0 + take),
            }),
            Signal::Sell => Some(RiskLevels {
                stop_loss: entry * (1.0 + stop),
                take_profit: entry * (1.0 - take),
            }),
            Signal::Hold => None,
        }
    }
}
